/// STL model parser (binary and ASCII)
use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    combinator::{map, opt},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, terminated, tuple},
    IResult,
};

use crate::error::CoreError;
use crate::geometry::{Mesh, Triangle, Vertex};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, CoreError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(CoreError::Stl("file too small to be a valid STL".to_string()));
    }

    let (body, _) = take::<_, _, nom::error::Error<&[u8]>>(HEADER_LEN)(data)
        .map_err(|e| CoreError::Stl(format!("{:?}", e)))?;
    let (body, triangle_count) = le_u32::<_, nom::error::Error<&[u8]>>(body)
        .map_err(|e| CoreError::Stl(format!("{:?}", e)))?;

    let expected = facet_bytes(triangle_count as usize)?;
    if body.len() < expected {
        return Err(CoreError::Stl(format!(
            "header declares {} triangles but only {} bytes follow",
            triangle_count,
            body.len()
        )));
    }

    let (_, triangles) = count(binary_facet, triangle_count as usize)(body)
        .map_err(|e| CoreError::Stl(format!("{:?}", e)))?;

    Ok(Mesh { triangles })
}

/// Bytes taken by `triangle_count` facets; the count comes from an untrusted header
fn facet_bytes(triangle_count: usize) -> Result<usize, CoreError> {
    triangle_count.checked_mul(FACET_LEN).ok_or_else(|| {
        CoreError::Stl(format!("header declares {} triangles, too many to address", triangle_count))
    })
}

fn le_vector3(input: &[u8]) -> IResult<&[u8], Vector3<f32>> {
    map(tuple((le_f32, le_f32, le_f32)), |(x, y, z)| Vector3::new(x, y, z))(input)
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, normal) = le_vector3(input)?;
    let (input, (a, b, c)) = tuple((le_vector3, le_vector3, le_vector3))(input)?;
    // Attribute byte count, unused
    let (input, _) = le_u16(input)?;
    let vertex = |p: Vector3<f32>| Vertex::new(Point3::from(p), normal);
    Ok((input, Triangle::new(vertex(a), vertex(b), vertex(c))))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, CoreError> {
    match ascii_solid(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(e) => Err(CoreError::Stl(format!("failed to parse ASCII STL: {:?}", e))),
    }
}

fn ascii_solid(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    // Optional solid name up to the end of the line
    let (input, _) = not_line_ending(input)?;
    let (input, triangles) = many0(ascii_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = opt(not_line_ending)(input)?;
    Ok((input, Mesh { triangles }))
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    preceded(multispace0, tag(word))
}

fn ascii_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = terminated(keyword("facet"), multispace1)(input)?;
    let (input, _) = tag("normal")(input)?;
    let (input, normal) = ascii_vector3(input)?;
    let (input, _) = terminated(keyword("outer"), multispace1)(input)?;
    let (input, _) = tag("loop")(input)?;
    let (input, a) = ascii_vertex(input)?;
    let (input, b) = ascii_vertex(input)?;
    let (input, c) = ascii_vertex(input)?;
    let (input, _) = keyword("endloop")(input)?;
    let (input, _) = keyword("endfacet")(input)?;

    let vertex = |p: Vector3<f32>| Vertex::new(Point3::from(p), normal);
    Ok((input, Triangle::new(vertex(a), vertex(b), vertex(c))))
}

fn ascii_vertex(input: &str) -> IResult<&str, Vector3<f32>> {
    preceded(keyword("vertex"), ascii_vector3)(input)
}

fn ascii_vector3(input: &str) -> IResult<&str, Vector3<f32>> {
    map(
        tuple((
            preceded(multispace1, float),
            preceded(multispace1, float),
            preceded(multispace1, float),
        )),
        |(x, y, z)| Vector3::new(x, y, z),
    )(input)
}

/// Detect and parse STL data (ASCII first when it starts with `solid`)
pub fn parse_stl(data: &[u8]) -> Result<Mesh, CoreError> {
    // Some binary exporters also start their header with "solid"
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}
