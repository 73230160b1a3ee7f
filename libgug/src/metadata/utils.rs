use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_till1},
    character::complete::{char, digit1, hex_digit1, one_of},
    combinator::{all_consuming, map, map_res, rest},
    sequence::{delimited, preceded, separated_pair},
    IResult,
};
use std::str::FromStr;

use super::error::Error;

/// One logical line of a `.gug` file
#[derive(Debug, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    Comment(&'a str),
    Section(&'a str),
    KeyValue(&'a str, &'a str),
}

fn comment(input: &str) -> IResult<&str, Line<'_>> {
    map(preceded(one_of(";#"), rest), Line::Comment)(input)
}

fn section(input: &str) -> IResult<&str, Line<'_>> {
    map(
        delimited(char('['), take_till1(|c| c == ']'), char(']')),
        |name: &str| Line::Section(name.trim()),
    )(input)
}

fn key_value(input: &str) -> IResult<&str, Line<'_>> {
    map(
        separated_pair(take_till1(|c| c == '='), char('='), rest),
        |(key, value): (&str, &str)| Line::KeyValue(key.trim(), value.trim()),
    )(input)
}

pub fn parse_line(input: &str) -> IResult<&str, Line<'_>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok((input, Line::Blank));
    }
    all_consuming(alt((comment, section, key_value)))(input)
}

/// Colors are written as decimal, `0x` hex or `#` hex
pub fn parse_color(input: &str) -> IResult<&str, u32> {
    alt((
        map_res(
            preceded(alt((tag_no_case("0x"), tag("#"))), hex_digit1),
            |hex: &str| u32::from_str_radix(hex, 16),
        ),
        map_res(digit1, |d: &str| d.parse::<u32>()),
    ))(input)
}

pub(super) fn parse_value<T: FromStr>(field: &'static str, value: &str) -> Result<T, Error> {
    value.parse().map_err(|_| Error::InvalidValue {
        field,
        value: value.to_owned(),
    })
}

/// Splits `map.gup,2` into the file name and the explicit image entry
pub fn split_path_index(value: &str) -> (&str, Option<u32>) {
    match value.rsplit_once(',') {
        Some((path, index)) => index
            .trim()
            .parse()
            .map_or((value, None), |index| (path.trim(), Some(index))),
        None => (value, None),
    }
}

pub fn split_gauges(value: &str) -> impl Iterator<Item = &str> {
    value
        .split([';', ','])
        .map(str::trim)
        .filter(|g| !g.is_empty())
}
