//! # Params Decoding
//!
//! Live events carry their query parameters as a literal list of
//! `key=value` fragments, the way an analytics store exports an array
//! column:
//!
//! ```text
//! ['appVersion=7.1.0','atb=v400-1','state=eyJwMSI6ZmFsc2V9']
//! ```
//!
//! [`parse_params_repr`] reads that list; [`to_query`] joins the fragments
//! back into a query string; [`parse_query`] reads the query as
//! form-urlencoded pairs (the last duplicate wins). Values are then run
//! through [`percent_decode`] and, for base64-encoded fields,
//! [`decode_base64`].
//!
//! None of the decoders fail hard: a value that does not decode is logged
//! and kept as it was, so the structural check reports it.

use std::borrow::Cow;
use std::collections::BTreeMap;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not},
    character::complete::{anychar, char, multispace0},
    combinator::{all_consuming, map, opt, value},
    multi::separated_list0,
    sequence::{delimited, terminated},
    IResult,
};

use crate::error::ParamsReprError;

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Parse a literal fragment list such as `['a=1','b=2']` or `["a=1"]`.
///
/// # Errors
///
/// Returns [`ParamsReprError`] if the input is not a bracketed list of
/// quoted strings.
pub fn parse_params_repr(input: &str) -> Result<Vec<String>, ParamsReprError> {
    match all_consuming(delimited(multispace0, fragment_list, multispace0))(input) {
        Ok((_, fragments)) => Ok(fragments),
        Err(e) => Err(ParamsReprError {
            reason: e.to_string(),
        }),
    }
}

fn fragment_list(input: &str) -> IResult<&str, Vec<String>> {
    delimited(
        terminated(char('['), multispace0),
        terminated(
            separated_list0(
                delimited(multispace0, char(','), multispace0),
                quoted,
            ),
            opt(delimited(multispace0, char(','), multispace0)),
        ),
        delimited(multispace0, char(']'), multispace0),
    )(input)
}

fn quoted(input: &str) -> IResult<&str, String> {
    alt((
        delimited(char('\''), |i| quoted_body(i, "'\\"), char('\'')),
        delimited(char('"'), |i| quoted_body(i, "\"\\"), char('"')),
    ))(input)
}

// `escaped_transform` rejects an empty body, hence the `opt`.
fn quoted_body<'a>(input: &'a str, stop: &'static str) -> IResult<&'a str, String> {
    map(
        opt(escaped_transform(
            is_not(stop),
            '\\',
            alt((
                value('\n', char('n')),
                value('\r', char('r')),
                value('\t', char('t')),
                anychar,
            )),
        )),
        Option::unwrap_or_default,
    )(input)
}

/// Join fragments into a query string.
pub fn to_query(fragments: &[String]) -> String {
    fragments.join("&")
}

/// Read a query string as form-urlencoded pairs. A repeated key keeps its
/// last value.
pub fn parse_query(query: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Percent-decode a value. Malformed escapes or invalid UTF-8 keep the raw
/// value.
pub fn percent_decode(raw: &str) -> Cow<'_, str> {
    if has_malformed_escape(raw) {
        tracing::warn!(value = raw, "failed to percent-decode param value");
        return Cow::Borrowed(raw);
    }
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded,
        Err(err) => {
            tracing::warn!(value = raw, error = %err, "failed to percent-decode param value");
            Cow::Borrowed(raw)
        }
    }
}

fn has_malformed_escape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b'%'
            && !(bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit))
    })
}

/// Decode standard or URL-safe base64, padding optional. Form decoding
/// turns `+` into a space, so spaces are read back as `+`.
pub fn decode_base64(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('+'),
            c if c.is_whitespace() => None,
            c => Some(c),
        })
        .collect();

    let bytes = STANDARD_LENIENT
        .decode(&cleaned)
        .or_else(|_| URL_SAFE_LENIENT.decode(&cleaned));
    match bytes {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(err) => {
            tracing::warn!(value = raw, error = %err, "failed to base64-decode param value");
            None
        }
    }
}
