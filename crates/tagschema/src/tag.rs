//! Constraint tag grammar and parser
//!
//! A constraint tag is a comma-separated sequence of `key:value` or
//! `key:[item,item,...]` clauses, e.g. `"maxLength:5,pattern:^[a-z]+$"`.
//! The parser is an iterative loop over clauses built on the byte [`Reader`];
//! keywords are recognized by a fixed four-byte prefix followed by a
//! keyword-specific suffix.
//!
//! Two deliberately non-obvious rules of the grammar:
//!
//! - `pattern` is a textual prefix of `patternProperties`, so after reading
//!   `pattern` the next byte decides: a delimiter means a `pattern` clause,
//!   anything else continues matching the longer keyword.
//! - `exclusiveMinimum` / `exclusiveMaximum` carry a dual meaning. The
//!   literal is first tried as a boolean; `true`/`false` stores the draft-4
//!   flag paired with `minimum`/`maximum`, anything else must parse as a
//!   decimal and becomes the standalone draft-6 bound. Both forms may be set
//!   on the same tag and are evaluated independently.
//!
//! There is no escaping mechanism: a literal `,` inside a pattern or list
//! item splits the clause early. This is a limitation of the grammar, not a
//! parser bug.

use std::fmt;

use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::number;
use crate::reader::Reader;

/// Error raised for a malformed constraint tag.
///
/// Parsing never partially accepts a tag: the first malformed clause aborts
/// the whole tag.
#[derive(Debug, Error)]
pub enum TagSyntaxError {
    #[error("unknown constraint keyword near byte {pos}")]
    UnknownKeyword { pos: usize },
    #[error("malformed `{keyword}` literal: `{literal}`")]
    BadLiteral {
        keyword: &'static str,
        literal: String,
    },
    #[error("invalid regular expression: {0}")]
    BadPattern(#[from] regex::Error),
    #[error("unterminated bracketed list")]
    UnterminatedList,
    #[error("unexpected end of tag")]
    UnexpectedEnd,
}

/// Parsed form of one field's constraint tag.
///
/// Every constraint is optional; "unset" is distinct from any zero value. A
/// set with nothing populated means "no constraints", which the parser
/// distinguishes from a syntax error by the `Result`.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    // numeric constraints
    pub minimum: Option<Decimal>,
    pub maximum: Option<Decimal>,
    /// Draft-4 exclusivity flag, paired with `minimum`.
    pub exclusive_minimum: Option<bool>,
    /// Draft-4 exclusivity flag, paired with `maximum`.
    pub exclusive_maximum: Option<bool>,
    /// Draft-6 standalone exclusive lower bound.
    pub exclusive_minimum_bound: Option<Decimal>,
    /// Draft-6 standalone exclusive upper bound.
    pub exclusive_maximum_bound: Option<Decimal>,
    pub multiple_of: Option<Decimal>,
    // string constraints
    /// Minimum length in Unicode code points, not bytes.
    pub min_length: Option<i64>,
    /// Maximum length in Unicode code points, not bytes.
    pub max_length: Option<i64>,
    pub pattern: Option<Regex>,
    /// Format name resolved against the registry at evaluation time.
    pub format: Option<String>,
    // sequence constraints
    pub min_items: Option<i64>,
    pub max_items: Option<i64>,
    pub unique_items: Option<bool>,
    // mapping constraints
    pub min_properties: Option<i64>,
    pub max_properties: Option<i64>,
    /// Applied to the canonical string form of every mapping key.
    pub pattern_properties: Option<Regex>,
    /// Ordered list of required key names; duplicates are kept as written.
    pub required: Vec<String>,
    // universal constraints
    /// Allowed canonical string representations.
    pub enum_values: Vec<String>,
}

impl ConstraintSet {
    /// Parse a raw constraint tag.
    ///
    /// An empty tag yields an empty set. Parsing is pure and deterministic,
    /// so results may be cached by the raw tag string.
    pub fn parse(tag: &str) -> Result<Self, TagSyntaxError> {
        let mut set = ConstraintSet::default();
        let mut r = Reader::new(tag);
        // Iterative clause loop; the grammar has no nesting that would need
        // recursion.
        while !r.is_eof() {
            set.read_clause(&mut r)?;
            // Bracketed-list clauses consume their closing `]` but leave the
            // clause separator behind.
            if r.peek() == Some(b',') {
                r.read_byte();
            }
        }
        Ok(set)
    }

    /// True iff no constraint is set.
    pub fn is_empty(&self) -> bool {
        self.minimum.is_none()
            && self.maximum.is_none()
            && self.exclusive_minimum.is_none()
            && self.exclusive_maximum.is_none()
            && self.exclusive_minimum_bound.is_none()
            && self.exclusive_maximum_bound.is_none()
            && self.multiple_of.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
            && self.format.is_none()
            && self.min_items.is_none()
            && self.max_items.is_none()
            && self.unique_items.is_none()
            && self.min_properties.is_none()
            && self.max_properties.is_none()
            && self.pattern_properties.is_none()
            && self.required.is_empty()
            && self.enum_values.is_empty()
    }

    fn read_clause(&mut self, r: &mut Reader<'_>) -> Result<(), TagSyntaxError> {
        let pos = r.pos();
        let prefix = r.read_bytes(4).ok_or(TagSyntaxError::UnexpectedEnd)?;
        match prefix {
            b"mini" => {
                expect(r, b"mum")?;
                delimiter(r)?;
                self.minimum = Some(decimal_literal(r, "minimum")?);
            }
            b"maxi" => {
                expect(r, b"mum")?;
                delimiter(r)?;
                self.maximum = Some(decimal_literal(r, "maximum")?);
            }
            b"excl" => {
                let pos = r.pos();
                let suffix = r.read_bytes(12).ok_or(TagSyntaxError::UnexpectedEnd)?;
                let is_minimum = match suffix {
                    b"usiveMinimum" => true,
                    b"usiveMaximum" => false,
                    _ => return Err(TagSyntaxError::UnknownKeyword { pos }),
                };
                delimiter(r)?;
                let keyword = if is_minimum {
                    "exclusiveMinimum"
                } else {
                    "exclusiveMaximum"
                };
                let lit = literal(r, keyword)?;
                // Boolean parse is attempted first; a numeric literal always
                // falls through to the draft-6 bound.
                match lit {
                    "true" | "false" => {
                        let flag = lit == "true";
                        if is_minimum {
                            self.exclusive_minimum = Some(flag);
                        } else {
                            self.exclusive_maximum = Some(flag);
                        }
                    }
                    _ => {
                        let bound = number::parse_decimal(lit).map_err(|_| {
                            TagSyntaxError::BadLiteral {
                                keyword,
                                literal: lit.to_string(),
                            }
                        })?;
                        if is_minimum {
                            self.exclusive_minimum_bound = Some(bound);
                        } else {
                            self.exclusive_maximum_bound = Some(bound);
                        }
                    }
                }
            }
            b"mult" => {
                expect(r, b"ipleOf")?;
                delimiter(r)?;
                self.multiple_of = Some(decimal_literal(r, "multipleOf")?);
            }
            b"minL" => {
                expect(r, b"ength")?;
                delimiter(r)?;
                self.min_length = Some(int_literal(r, "minLength")?);
            }
            b"maxL" => {
                expect(r, b"ength")?;
                delimiter(r)?;
                self.max_length = Some(int_literal(r, "maxLength")?);
            }
            b"patt" => {
                expect(r, b"ern")?;
                // `pattern` is a prefix of `patternProperties`; one byte of
                // lookahead disambiguates.
                match r.read_byte() {
                    Some(b':') | Some(b'=') => {
                        self.pattern = Some(regex_literal(r, "pattern")?);
                    }
                    Some(b'P') => {
                        expect(r, b"roperties")?;
                        delimiter(r)?;
                        self.pattern_properties =
                            Some(regex_literal(r, "patternProperties")?);
                    }
                    Some(_) => return Err(TagSyntaxError::UnknownKeyword { pos }),
                    None => return Err(TagSyntaxError::UnexpectedEnd),
                }
            }
            b"form" => {
                expect(r, b"at")?;
                delimiter(r)?;
                // Opaque at parse time; unknown names fail at evaluation.
                self.format = Some(literal(r, "format")?.to_string());
            }
            b"minI" => {
                expect(r, b"tems")?;
                delimiter(r)?;
                self.min_items = Some(int_literal(r, "minItems")?);
            }
            b"maxI" => {
                expect(r, b"tems")?;
                delimiter(r)?;
                self.max_items = Some(int_literal(r, "maxItems")?);
            }
            b"uniq" => {
                expect(r, b"ueItems")?;
                delimiter(r)?;
                let lit = literal(r, "uniqueItems")?;
                self.unique_items = Some(match lit {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(TagSyntaxError::BadLiteral {
                            keyword: "uniqueItems",
                            literal: lit.to_string(),
                        })
                    }
                });
            }
            b"minP" => {
                expect(r, b"roperties")?;
                delimiter(r)?;
                self.min_properties = Some(int_literal(r, "minProperties")?);
            }
            b"maxP" => {
                expect(r, b"roperties")?;
                delimiter(r)?;
                self.max_properties = Some(int_literal(r, "maxProperties")?);
            }
            b"requ" => {
                expect(r, b"ired")?;
                delimiter(r)?;
                self.required = bracket_list(r, "required")?;
            }
            b"enum" => {
                delimiter(r)?;
                self.enum_values = bracket_list(r, "enum")?;
            }
            _ => return Err(TagSyntaxError::UnknownKeyword { pos }),
        }
        Ok(())
    }
}

/// Canonical tag form: `Display` output re-parses to an equivalent set.
impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut clauses: Vec<String> = Vec::new();
        if let Some(n) = &self.minimum {
            clauses.push(format!("minimum:{}", number::canonical(n)));
        }
        if let Some(n) = &self.maximum {
            clauses.push(format!("maximum:{}", number::canonical(n)));
        }
        if let Some(flag) = self.exclusive_minimum {
            clauses.push(format!("exclusiveMinimum:{flag}"));
        }
        if let Some(flag) = self.exclusive_maximum {
            clauses.push(format!("exclusiveMaximum:{flag}"));
        }
        if let Some(n) = &self.exclusive_minimum_bound {
            clauses.push(format!("exclusiveMinimum:{}", number::canonical(n)));
        }
        if let Some(n) = &self.exclusive_maximum_bound {
            clauses.push(format!("exclusiveMaximum:{}", number::canonical(n)));
        }
        if let Some(n) = &self.multiple_of {
            clauses.push(format!("multipleOf:{}", number::canonical(n)));
        }
        if let Some(n) = self.min_length {
            clauses.push(format!("minLength:{n}"));
        }
        if let Some(n) = self.max_length {
            clauses.push(format!("maxLength:{n}"));
        }
        if let Some(re) = &self.pattern {
            clauses.push(format!("pattern:{}", re.as_str()));
        }
        if let Some(name) = &self.format {
            clauses.push(format!("format:{name}"));
        }
        if let Some(n) = self.min_items {
            clauses.push(format!("minItems:{n}"));
        }
        if let Some(n) = self.max_items {
            clauses.push(format!("maxItems:{n}"));
        }
        if let Some(flag) = self.unique_items {
            clauses.push(format!("uniqueItems:{flag}"));
        }
        if let Some(n) = self.min_properties {
            clauses.push(format!("minProperties:{n}"));
        }
        if let Some(n) = self.max_properties {
            clauses.push(format!("maxProperties:{n}"));
        }
        if let Some(re) = &self.pattern_properties {
            clauses.push(format!("patternProperties:{}", re.as_str()));
        }
        if !self.required.is_empty() {
            clauses.push(format!("required:[{}]", self.required.join(",")));
        }
        if !self.enum_values.is_empty() {
            clauses.push(format!("enum:[{}]", self.enum_values.join(",")));
        }
        f.write_str(&clauses.join(","))
    }
}

// ============================================================================
// Literal readers
// ============================================================================

fn expect(r: &mut Reader<'_>, suffix: &'static [u8]) -> Result<(), TagSyntaxError> {
    let pos = r.pos();
    match r.read_bytes(suffix.len()) {
        Some(got) if got == suffix => Ok(()),
        Some(_) => Err(TagSyntaxError::UnknownKeyword { pos }),
        None => Err(TagSyntaxError::UnexpectedEnd),
    }
}

fn delimiter(r: &mut Reader<'_>) -> Result<(), TagSyntaxError> {
    if r.skip_delimiter() {
        Ok(())
    } else {
        Err(TagSyntaxError::UnexpectedEnd)
    }
}

fn literal<'a>(r: &mut Reader<'a>, keyword: &'static str) -> Result<&'a str, TagSyntaxError> {
    let bytes = r.read_separator();
    std::str::from_utf8(bytes).map_err(|_| TagSyntaxError::BadLiteral {
        keyword,
        literal: String::from_utf8_lossy(bytes).into_owned(),
    })
}

fn decimal_literal(r: &mut Reader<'_>, keyword: &'static str) -> Result<Decimal, TagSyntaxError> {
    let lit = literal(r, keyword)?;
    number::parse_decimal(lit).map_err(|_| TagSyntaxError::BadLiteral {
        keyword,
        literal: lit.to_string(),
    })
}

fn int_literal(r: &mut Reader<'_>, keyword: &'static str) -> Result<i64, TagSyntaxError> {
    let lit = literal(r, keyword)?;
    lit.parse::<i64>().map_err(|_| TagSyntaxError::BadLiteral {
        keyword,
        literal: lit.to_string(),
    })
}

fn regex_literal(r: &mut Reader<'_>, keyword: &'static str) -> Result<Regex, TagSyntaxError> {
    Ok(Regex::new(literal(r, keyword)?)?)
}

/// Read a `[a,b,c]` list of bare tokens, trimming surrounding whitespace per
/// token. Running out of input before the closing bracket is a syntax error.
fn bracket_list(r: &mut Reader<'_>, keyword: &'static str) -> Result<Vec<String>, TagSyntaxError> {
    let mut items = Vec::new();
    let mut buf: Vec<u8> = Vec::new();
    let push = |buf: &mut Vec<u8>| -> Result<String, TagSyntaxError> {
        let raw = std::mem::take(buf);
        let text = String::from_utf8(raw).map_err(|e| TagSyntaxError::BadLiteral {
            keyword,
            literal: String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })?;
        Ok(text.trim().to_string())
    };
    loop {
        match r.read_byte() {
            None => return Err(TagSyntaxError::UnterminatedList),
            Some(b'[') => continue,
            Some(b']') => {
                if !buf.is_empty() || !items.is_empty() {
                    items.push(push(&mut buf)?);
                }
                break;
            }
            Some(b',') => items.push(push(&mut buf)?),
            Some(b) => buf.push(b),
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_empty_tag() {
        let set = ConstraintSet::parse("").unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_numeric_bounds() {
        let set = ConstraintSet::parse("minimum:5,maximum:10.5").unwrap();
        assert_eq!(set.minimum, Some(Decimal::from(5)));
        assert_eq!(set.maximum, Some(Decimal::from_str("10.5").unwrap()));
        assert!(!set.is_empty());
    }

    #[test]
    fn test_equals_delimiter() {
        let set = ConstraintSet::parse("minimum=5").unwrap();
        assert_eq!(set.minimum, Some(Decimal::from(5)));
    }

    #[test]
    fn test_exclusive_draft4_flag() {
        let set = ConstraintSet::parse("minimum:5,exclusiveMinimum:true").unwrap();
        assert_eq!(set.exclusive_minimum, Some(true));
        assert_eq!(set.exclusive_minimum_bound, None);

        let set = ConstraintSet::parse("maximum:5,exclusiveMaximum:false").unwrap();
        assert_eq!(set.exclusive_maximum, Some(false));
    }

    #[test]
    fn test_exclusive_draft6_bound() {
        let set = ConstraintSet::parse("exclusiveMinimum:3.5,exclusiveMaximum:9").unwrap();
        assert_eq!(
            set.exclusive_minimum_bound,
            Some(Decimal::from_str("3.5").unwrap())
        );
        assert_eq!(set.exclusive_maximum_bound, Some(Decimal::from(9)));
        assert_eq!(set.exclusive_minimum, None);
        assert_eq!(set.exclusive_maximum, None);
    }

    #[test]
    fn test_exclusive_both_forms_coexist() {
        let set =
            ConstraintSet::parse("exclusiveMinimum:true,exclusiveMaximum:9").unwrap();
        assert_eq!(set.exclusive_minimum, Some(true));
        assert_eq!(set.exclusive_maximum_bound, Some(Decimal::from(9)));
    }

    #[test]
    fn test_exclusive_garbage_literal() {
        assert!(ConstraintSet::parse("exclusiveMinimum:maybe").is_err());
    }

    #[test]
    fn test_multiple_of() {
        let set = ConstraintSet::parse("multipleOf:2.5").unwrap();
        assert_eq!(set.multiple_of, Some(Decimal::from_str("2.5").unwrap()));
    }

    #[test]
    fn test_lengths_and_pattern() {
        let set = ConstraintSet::parse("minLength:2,maxLength:5,pattern:^[a-z]+$").unwrap();
        assert_eq!(set.min_length, Some(2));
        assert_eq!(set.max_length, Some(5));
        assert_eq!(set.pattern.as_ref().unwrap().as_str(), "^[a-z]+$");
    }

    #[test]
    fn test_pattern_properties_lookahead() {
        let set = ConstraintSet::parse("patternProperties:^x-").unwrap();
        assert!(set.pattern.is_none());
        assert_eq!(set.pattern_properties.as_ref().unwrap().as_str(), "^x-");
    }

    #[test]
    fn test_pattern_and_pattern_properties_together() {
        let set = ConstraintSet::parse("pattern:^a$,patternProperties:^b$").unwrap();
        assert_eq!(set.pattern.as_ref().unwrap().as_str(), "^a$");
        assert_eq!(set.pattern_properties.as_ref().unwrap().as_str(), "^b$");
    }

    #[test]
    fn test_invalid_regex_is_syntax_error() {
        assert!(matches!(
            ConstraintSet::parse("pattern:["),
            Err(TagSyntaxError::BadPattern(_))
        ));
    }

    #[test]
    fn test_format_is_opaque() {
        let set = ConstraintSet::parse("format:no-such-format").unwrap();
        assert_eq!(set.format.as_deref(), Some("no-such-format"));
    }

    #[test]
    fn test_items_and_unique() {
        let set = ConstraintSet::parse("minItems:1,maxItems:3,uniqueItems:true").unwrap();
        assert_eq!(set.min_items, Some(1));
        assert_eq!(set.max_items, Some(3));
        assert_eq!(set.unique_items, Some(true));
    }

    #[test]
    fn test_unique_items_bad_literal() {
        assert!(ConstraintSet::parse("uniqueItems:yes").is_err());
    }

    #[test]
    fn test_properties_bounds() {
        let set = ConstraintSet::parse("minProperties:1,maxProperties:4").unwrap();
        assert_eq!(set.min_properties, Some(1));
        assert_eq!(set.max_properties, Some(4));
    }

    #[test]
    fn test_required_list_trims_and_keeps_order() {
        let set = ConstraintSet::parse("required:[a, b ,c]").unwrap();
        assert_eq!(set.required, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_required_keeps_duplicates() {
        let set = ConstraintSet::parse("required:[a,a,b]").unwrap();
        assert_eq!(set.required, vec!["a", "a", "b"]);
    }

    #[test]
    fn test_enum_list() {
        let set = ConstraintSet::parse("enum:[red,green,blue]").unwrap();
        assert_eq!(set.enum_values, vec!["red", "green", "blue"]);
    }

    #[test]
    fn test_unterminated_list() {
        assert!(matches!(
            ConstraintSet::parse("required:[a,b"),
            Err(TagSyntaxError::UnterminatedList)
        ));
        assert!(matches!(
            ConstraintSet::parse("enum:[x"),
            Err(TagSyntaxError::UnterminatedList)
        ));
    }

    #[test]
    fn test_list_followed_by_clause() {
        let set = ConstraintSet::parse("required:[a,b],minProperties:2").unwrap();
        assert_eq!(set.required, vec!["a", "b"]);
        assert_eq!(set.min_properties, Some(2));
    }

    #[test]
    fn test_unknown_keyword() {
        assert!(matches!(
            ConstraintSet::parse("bogus:5"),
            Err(TagSyntaxError::UnknownKeyword { .. })
        ));
        // Prefix matches `minimum` but the suffix does not.
        assert!(ConstraintSet::parse("minimal:5").is_err());
    }

    #[test]
    fn test_bad_numeric_literal() {
        assert!(matches!(
            ConstraintSet::parse("minimum:abc"),
            Err(TagSyntaxError::BadLiteral { keyword: "minimum", .. })
        ));
        assert!(ConstraintSet::parse("minLength:2.5").is_err());
    }

    #[test]
    fn test_comma_splits_pattern_early() {
        // Grammar limitation: the comma inside the character class ends the
        // clause, and the remainder is not a valid keyword.
        assert!(ConstraintSet::parse("pattern:^[a,b]$").is_err());
    }

    #[test]
    fn test_canonical_round_trip() {
        let tags = [
            "minimum:5,maximum:10,exclusiveMinimum:true,multipleOf:2.5",
            "minLength:2,maxLength:5,pattern:^[a-z]+$,format:email",
            "minItems:1,maxItems:9,uniqueItems:true",
            "minProperties:1,maxProperties:3,patternProperties:^x-,required:[a,b],enum:[1,2]",
            "exclusiveMinimum:3.5,exclusiveMaximum:false",
        ];
        for tag in tags {
            let first = ConstraintSet::parse(tag).unwrap();
            let canonical = first.to_string();
            let second = ConstraintSet::parse(&canonical).unwrap();
            assert_eq!(canonical, second.to_string(), "round-trip failed for {tag}");
        }
    }
}
