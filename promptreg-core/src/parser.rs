use nom::branch::alt;
use nom::bytes::complete::{tag, take_until, take_while_m_n};
use nom::character::complete::{char, space0};
use nom::combinator::{all_consuming, map, opt, rest, verify};
use nom::multi::{many0, separated_list1};
use nom::sequence::{delimited, preceded};
use nom::IResult;
use nom::Parser;
use crate::template::{FieldPath, TemplatePart};

pub fn parse_template(input: &str) -> IResult<&str, Vec<TemplatePart>> {
    all_consuming(many0(parse_element)).parse(input)
}

pub fn parse_element(input: &str) -> IResult<&str, TemplatePart> {
    alt((
        map(parse_escaped_literal, |text| TemplatePart::Literal(text.to_string())),
        map(parse_field, TemplatePart::Field),
        map(parse_literal_text, |text| TemplatePart::Literal(text.to_string())),
    )).parse(input)
}

pub fn parse_literal_text(input: &str) -> IResult<&str, &str> {
    verify(
        alt((
            take_until("{{"),
            rest,
        )),
        |s: &&str| !s.is_empty(),
    ).parse(input)
}

/// Parses `{{path}}`, `{{ path }}` or `{{.path}}`.
pub fn parse_field(input: &str) -> IResult<&str, FieldPath> {
    delimited(
        tag("{{"),
        delimited(space0, field_path, space0),
        tag("}}"),
    ).parse(input)
}

pub fn parse_escaped_literal(input: &str) -> IResult<&str, &str> {
    delimited(tag("{{{{"), take_until("}}}}"), tag("}}}}")).parse(input)
}

fn field_path(input: &str) -> IResult<&str, FieldPath> {
    map(
        preceded(opt(char('.')), separated_list1(char('.'), identifier)),
        |segments: Vec<&str>| FieldPath::new(segments.into_iter().map(str::to_string).collect()),
    ).parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    // Limit identifiers to 1-64 characters with alphanumeric, dash, underscore
    take_while_m_n(
        1,
        64,
        |c: char| c.is_alphanumeric() || c == '-' || c == '_'
    ).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(path: &str) -> TemplatePart {
        TemplatePart::Field(FieldPath::new(path.split('.').map(str::to_string).collect()))
    }

    #[test]
    fn test_parse_empty() {
        let result = parse_literal_text("");
        assert!(result.is_err());

        let (remaining, parts) = parse_template("").unwrap();
        assert_eq!(remaining, "");
        assert!(parts.is_empty());
    }

    #[test]
    fn test_parse_literal_text() {
        let result = parse_literal_text("Hello!");
        assert_eq!(result, Ok(("", "Hello!")));
    }

    #[test]
    fn test_parse_field() {
        let (remaining, path) = parse_field("{{topic}} is the subject").unwrap();
        assert_eq!(remaining, " is the subject");
        assert_eq!(path.to_string(), "topic");
    }

    #[test]
    fn test_parse_field_with_leading_dot() {
        let (remaining, path) = parse_field("{{.topic}}").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(path.segments(), ["topic".to_string()]);
    }

    #[test]
    fn test_parse_field_with_whitespace() {
        let (_, path) = parse_field("{{ topic }}").unwrap();
        assert_eq!(path.to_string(), "topic");

        let (_, path) = parse_field("{{  .user.name\t}}").unwrap();
        assert_eq!(path.to_string(), "user.name");
    }

    #[test]
    fn test_parse_nested_field() {
        let (_, path) = parse_field("{{agent.tools.0}}").unwrap();
        assert_eq!(path.segments().len(), 3);
        assert_eq!(path.to_string(), "agent.tools.0");
    }

    #[test]
    fn test_parse_invalid_field() {
        assert!(parse_field("{{to/pic}} is the subject").is_err());
        assert!(parse_field("{{user..name}}").is_err());
        assert!(parse_field("{{user.}}").is_err());
        assert!(parse_field("{{in side}}").is_err());
    }

    #[test]
    fn test_parse_empty_identifier() {
        assert!(parse_field("{{}}").is_err(), "Empty identifier should fail");
        assert!(parse_field("{{.}}").is_err(), "Lone dot should fail");
    }

    #[test]
    fn test_parse_consecutive_fields() {
        let (remaining, parts) = parse_template("{{a}}{{b}}{{c}}").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(parts, vec![field("a"), field("b"), field("c")]);
    }

    #[test]
    fn test_parse_fields_at_boundaries() {
        let (_, parts) = parse_template("{{start}}middle{{end}}").unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], TemplatePart::Literal("middle".to_string()));
    }

    #[test]
    fn test_parse_incomplete_templates() {
        assert!(parse_template("Hello {{name").is_err()); // Missing closing }}
        assert!(parse_template("{{{{hello").is_err()); // Missing closing }}}}
        assert!(parse_template("Trailing {{").is_err());
    }

    #[test]
    fn test_parse_special_characters_in_literals() {
        let (_, parts) = parse_template("Hello {name} with } braces").unwrap();
        assert_eq!(parts, vec![TemplatePart::Literal("Hello {name} with } braces".to_string())]);
    }

    #[test]
    fn test_parse_escaped_literal() {
        let result = parse_escaped_literal("{{{{he{llo wo}rld}}}} more text");
        assert_eq!(result, Ok((" more text", "he{llo wo}rld")));
    }

    #[test]
    fn test_parse_element_escaped_literal() {
        let result = parse_element("{{{{hello{{username}}bye}}}}");
        assert_eq!(result, Ok(("", TemplatePart::Literal(String::from("hello{{username}}bye")))));
    }

    #[test]
    fn test_parse_element_invalid_field() {
        assert!(parse_element("{{user&name}}").is_err());
    }

    #[test]
    fn test_parse_template() {
        let (_, parts) = parse_template("You are a helpful agent who can answer questions about {{.topic}}.").unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], field("topic"));
    }

    #[test]
    fn test_parse_invalid_template() {
        assert!(parse_template("Hello {{n@me}}, welcome!").is_err());
    }

    #[test]
    fn test_parse_template_with_escaped_literals() {
        let (_, parts) = parse_template("Hello {{{{name}}}} is not a field, but {{real_name}} is").unwrap();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[1], TemplatePart::Literal("name".to_string()));
        assert_eq!(parts[3], field("real_name"));
    }

    #[test]
    fn test_parse_identifier_lengths() {
        for length in [1, 2, 63, 64] {
            let id = "a".repeat(length);
            let input = format!("{{{{{}}}}}", id);
            let result = parse_field(&input);
            assert!(result.is_ok(), "{} character identifier should work. Error: {:?}", length, result.err());
        }

        for length in [65, 100, 1000] {
            let id = "a".repeat(length);
            let input = format!("{{{{{}}}}}", id);
            assert!(parse_field(&input).is_err(), "{} character identifier should fail", length);
        }
    }
}
