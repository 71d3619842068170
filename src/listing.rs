//! Smali-style text listings
//!
//! Reads instruction listings such as
//!
//! ```text
//! .class public Lcom/example/Foo;
//! .method public static mix(I)I
//!     const/16 v0, 0x2a          # answer
//!     add-int/lit8 v1, v0, 0x1
//!     if-eqz v1, :done
//!     const-string v2, "hi"
//!     invoke-static {v1, v2}, Lcom/example/Foo;->log(ILjava/lang/String;)V
//!   :done
//!     return v1
//! .end method
//! ```
//!
//! into [`Instruction`]s. Labels and directives other than `.class`,
//! `.method` and `.end method` are skipped. Parameter registers (`pN`) are
//! not supported because their numbering depends on the method's register
//! count.
//!
//! Literals of the `high16` forms are written as the full value, the way a
//! disassembler prints them, and stored as the encoded 16-bit field.

use std::fmt;

use regex::Regex;

use crate::bytecode::{Format, Instruction, Opcode, Operand};
use crate::prepare::MethodBody;

/// Result of listing parsing
pub type ListingResult<T> = Result<T, ListingError>;

/// Errors while reading a listing. Line numbers start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    /// The mnemonic names no known opcode
    UnknownMnemonic { line: usize, mnemonic: String },
    /// An operand could not be parsed
    BadOperand {
        line: usize,
        operand: String,
        reason: &'static str,
    },
    /// `.method` / `.end method` nesting is broken
    Structure { line: usize, message: &'static str },
    /// Internal pattern failed to compile
    Pattern(String),
}

impl fmt::Display for ListingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMnemonic { line, mnemonic } => {
                write!(f, "line {}: unknown mnemonic '{}'", line, mnemonic)
            }
            Self::BadOperand {
                line,
                operand,
                reason,
            } => write!(f, "line {}: bad operand '{}': {}", line, operand, reason),
            Self::Structure { line, message } => write!(f, "line {}: {}", line, message),
            Self::Pattern(msg) => write!(f, "pattern error: {}", msg),
        }
    }
}

impl std::error::Error for ListingError {}

/// Parse every instruction in `source`, ignoring method boundaries
pub fn parse_listing(source: &str) -> ListingResult<Vec<Instruction>> {
    let parser = LineParser::new()?;
    let mut instructions = Vec::new();
    for (n, raw) in source.lines().enumerate() {
        if let Line::Instruction(insn) = parser.parse_line(raw, n + 1)? {
            instructions.push(insn);
        }
    }
    Ok(instructions)
}

/// Parse a listing into method bodies.
///
/// Each `.method` ... `.end method` block becomes one body, named
/// `<class>-><name><proto>` when a `.class` directive precedes it. A listing
/// without `.method` directives yields a single body with an empty
/// descriptor.
pub fn parse_methods(source: &str) -> ListingResult<Vec<MethodBody>> {
    let parser = LineParser::new()?;
    let mut class = String::new();
    let mut bodies = Vec::new();
    let mut current: Option<MethodBody> = None;
    let mut loose = Vec::new();
    let mut loose_line = None;

    for (n, raw) in source.lines().enumerate() {
        let line = n + 1;
        match parser.parse_line(raw, line)? {
            Line::Class(descriptor) => class = descriptor,
            Line::MethodStart(signature) => {
                if current.is_some() {
                    return Err(ListingError::Structure {
                        line,
                        message: "nested .method",
                    });
                }
                let descriptor = if class.is_empty() {
                    signature
                } else {
                    format!("{}->{}", class, signature)
                };
                current = Some(MethodBody::new(descriptor, Vec::new()));
            }
            Line::MethodEnd => match current.take() {
                Some(body) => bodies.push(body),
                None => {
                    return Err(ListingError::Structure {
                        line,
                        message: ".end method without .method",
                    })
                }
            },
            Line::Instruction(insn) => match current.as_mut() {
                Some(body) => body.instructions.push(insn),
                None => {
                    loose_line.get_or_insert(line);
                    loose.push(insn);
                }
            },
            Line::Skip => {}
        }
    }

    if current.is_some() {
        return Err(ListingError::Structure {
            line: source.lines().count(),
            message: "missing .end method",
        });
    }
    match (bodies.is_empty(), loose_line) {
        (true, _) => Ok(vec![MethodBody::new("", loose)]),
        (false, None) => Ok(bodies),
        (false, Some(line)) => Err(ListingError::Structure {
            line,
            message: "instruction outside .method",
        }),
    }
}

enum Line {
    Skip,
    Class(String),
    MethodStart(String),
    MethodEnd,
    Instruction(Instruction),
}

struct LineParser {
    register: Regex,
    register_range: Regex,
    literal: Regex,
    type_descriptor: Regex,
}

impl LineParser {
    fn new() -> ListingResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| ListingError::Pattern(e.to_string()))
        };
        Ok(Self {
            register: compile(r"^v(\d+)$")?,
            register_range: compile(r"^v(\d+)\s*\.\.\s*v(\d+)$")?,
            literal: compile(r"^([+-])?(0[xX][0-9a-fA-F]+|\d+)([LlTtSs])?$")?,
            type_descriptor: compile(r"^\[*([VZBSCIJFD]|L[^;\s]+;)$")?,
        })
    }

    fn parse_line(&self, raw: &str, line: usize) -> ListingResult<Line> {
        let text = strip_comment(raw).trim();
        if text.is_empty() || text.starts_with(':') {
            return Ok(Line::Skip);
        }
        if let Some(directive) = text.strip_prefix('.') {
            let mut words = directive.split_whitespace();
            return Ok(match (words.next(), words.last()) {
                (Some("class"), Some(descriptor)) => Line::Class(descriptor.to_string()),
                (Some("method"), Some(signature)) => Line::MethodStart(signature.to_string()),
                (Some("end"), Some("method")) => Line::MethodEnd,
                _ => Line::Skip,
            });
        }

        let (mnemonic, rest) = match text.split_once(char::is_whitespace) {
            Some((m, rest)) => (m, rest.trim()),
            None => (text, ""),
        };
        let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| ListingError::UnknownMnemonic {
            line,
            mnemonic: mnemonic.to_string(),
        })?;

        let mut operands = Vec::new();
        for operand in split_operands(rest) {
            self.parse_operand(opcode, operand, line, &mut operands)?;
        }
        if opcode.format() == Format::F21h {
            encode_high16(opcode, &mut operands, line)?;
        }
        Ok(Line::Instruction(Instruction::new(opcode, operands)))
    }

    fn parse_operand(
        &self,
        opcode: Opcode,
        text: &str,
        line: usize,
        out: &mut Vec<Operand>,
    ) -> ListingResult<()> {
        let bad = |reason| ListingError::BadOperand {
            line,
            operand: text.to_string(),
            reason,
        };

        if let Some(inner) = text.strip_prefix('{') {
            let inner = inner.strip_suffix('}').ok_or_else(|| bad("unbalanced braces"))?.trim();
            if inner.is_empty() {
                return Ok(());
            }
            if let Some(caps) = self.register_range.captures(inner) {
                let first =
                    parse_register(&caps[1]).ok_or_else(|| bad("register number too large"))?;
                let last =
                    parse_register(&caps[2]).ok_or_else(|| bad("register number too large"))?;
                if last < first {
                    return Err(bad("empty register range"));
                }
                out.extend((first..=last).map(Operand::Register));
                return Ok(());
            }
            for reg in inner.split(',') {
                let reg = self
                    .register(reg.trim())
                    .ok_or_else(|| bad("expected vN register"))?;
                out.push(Operand::Register(reg));
            }
            return Ok(());
        }

        let parameter = text.len() > 1
            && text.starts_with('p')
            && text[1..].bytes().all(|b| b.is_ascii_digit());
        if parameter {
            return Err(bad("parameter registers are not supported"));
        }
        let operand = if let Some(caps) = self.register.captures(text) {
            let reg = parse_register(&caps[1]).ok_or_else(|| bad("register number too large"))?;
            Operand::Register(reg)
        } else if let Some(label) = text.strip_prefix(':') {
            Operand::Label(label.to_string())
        } else if text.starts_with('"') {
            Operand::StringRef(unescape(text).ok_or_else(|| bad("malformed string"))?)
        } else if let Some(caps) = self.literal.captures(text) {
            Operand::Literal(parse_literal(&caps).ok_or_else(|| bad("literal out of range"))?)
        } else if text.starts_with('(') {
            Operand::ProtoRef(text.to_string())
        } else if matches!(opcode, Opcode::InvokeCustom | Opcode::InvokeCustomRange) {
            Operand::CallSiteRef(text.to_string())
        } else if text.contains('@') {
            Operand::MethodHandleRef(text.to_string())
        } else if let Some((class, member)) = text.split_once("->") {
            if !self.type_descriptor.is_match(class) {
                return Err(bad("expected a class descriptor before '->'"));
            }
            if member.contains('(') {
                Operand::MethodRef(text.to_string())
            } else {
                Operand::FieldRef(text.to_string())
            }
        } else if self.type_descriptor.is_match(text) {
            Operand::TypeRef(text.to_string())
        } else {
            return Err(bad("unrecognized operand"));
        };
        out.push(operand);
        Ok(())
    }

    fn register(&self, text: &str) -> Option<u16> {
        let caps = self.register.captures(text)?;
        parse_register(&caps[1])
    }
}

fn parse_register(digits: &str) -> Option<u16> {
    digits.parse().ok()
}

fn parse_literal(caps: &regex::Captures<'_>) -> Option<i64> {
    let digits = &caps[2];
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u64>().ok()?,
    };
    let value = match caps.get(1).map(|m| m.as_str()) {
        Some("-") => -(magnitude as i128),
        _ => magnitude as i128,
    };
    i64::try_from(value).ok()
}

// Replace the full-width literal of a high16 form with its encoded field
fn encode_high16(opcode: Opcode, operands: &mut [Operand], line: usize) -> ListingResult<()> {
    let shift = if opcode == Opcode::ConstWideHigh16 { 48 } else { 16 };
    if let Some(Operand::Literal(value)) = operands.get_mut(1) {
        let low_mask = (1i64 << shift) - 1;
        if *value & low_mask != 0 {
            return Err(ListingError::BadOperand {
                line,
                operand: format!("{:#x}", value),
                reason: "low bits of a high16 literal must be zero",
            });
        }
        *value >>= shift;
    }
    Ok(())
}

// Cut a trailing `#` comment, leaving `#` inside string literals alone
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

// Split on top-level commas; braces, parentheses and strings group
fn split_operands(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' | '(' if !in_string => depth += 1,
            '}' | ')' if !in_string => depth = depth.saturating_sub(1),
            ',' if !in_string && depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

fn unescape(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            '0' => out.push('\0'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '\\' => out.push('\\'),
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 {
                    return None;
                }
                out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
            }
            _ => return None,
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_listing() {
        let source = r#"
            # leading comment
            const/4 v0, 0x3
            const/16 v1, -100      # trailing comment
          :loop
            add-int v2, v0, v1
            return-void
        "#;
        let insns = parse_listing(source).unwrap();
        assert_eq!(
            insns,
            vec![
                Instruction::new(Opcode::Const4, [Operand::Register(0), Operand::Literal(3)]),
                Instruction::new(Opcode::Const16, [Operand::Register(1), Operand::Literal(-100)]),
                Instruction::new(
                    Opcode::AddInt,
                    [Operand::Register(2), Operand::Register(0), Operand::Register(1)],
                ),
                Instruction::new(Opcode::ReturnVoid, []),
            ]
        );
    }

    #[test]
    fn test_operand_kinds() {
        let source = r#"
            const-string v0, "a, b # c\n"
            const-class v1, [Ljava/lang/String;
            if-eqz v0, :cond_0
            sget-object v2, Ljava/lang/System;->out:Ljava/io/PrintStream;
            invoke-virtual {v2, v0}, Ljava/io/PrintStream;->println(Ljava/lang/String;)V
            invoke-static/range {v0 .. v3}, Lfoo/Bar;->baz(IIII)V
            const-wide v4, 0x7fffffffffffffffL
        "#;
        let insns = parse_listing(source).unwrap();
        assert_eq!(insns[0].operand(1), Some(&Operand::StringRef("a, b # c\n".into())));
        assert_eq!(insns[1].operand(1), Some(&Operand::TypeRef("[Ljava/lang/String;".into())));
        assert_eq!(insns[2].operand(1), Some(&Operand::Label("cond_0".into())));
        assert!(matches!(insns[3].operand(1), Some(Operand::FieldRef(_))));
        assert_eq!(insns[4].operands().len(), 3);
        assert!(matches!(insns[4].operand(2), Some(Operand::MethodRef(_))));
        assert_eq!(
            &insns[5].operands()[..4],
            &[
                Operand::Register(0),
                Operand::Register(1),
                Operand::Register(2),
                Operand::Register(3)
            ]
        );
        assert_eq!(insns[6].literal(1), Some(i64::MAX));
    }

    #[test]
    fn test_literal_forms() {
        let insns = parse_listing(
            "const/4 v0, -0x8\nconst-wide/16 v0, 10L\nconst/16 v0, +7s\n\
             const-wide v0, -0x8000000000000000L",
        )
        .unwrap();
        let literals: Vec<i64> = insns.iter().filter_map(|i| i.literal(1)).collect();
        assert_eq!(literals, vec![-8, 10, 7, i64::MIN]);

        assert!(matches!(
            parse_listing("const-wide v0, 0x8000000000000000L"),
            Err(ListingError::BadOperand { line: 1, .. })
        ));
    }

    #[test]
    fn test_high16_literals_are_encoded() {
        let insns = parse_listing(
            "const/high16 v0, 0x7f010000\nconst-wide/high16 v0, 0x4024000000000000L\n\
             const/high16 v1, -0x80000000",
        )
        .unwrap();
        assert_eq!(insns[0].literal(1), Some(0x7f01));
        assert_eq!(insns[1].literal(1), Some(0x4024));
        assert_eq!(insns[2].literal(1), Some(-0x8000));

        let err = parse_listing("\nconst/high16 v0, 0x12345").unwrap_err();
        assert!(matches!(err, ListingError::BadOperand { line: 2, .. }));
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let err = parse_listing("nop\n\nfrobnicate v0").unwrap_err();
        assert_eq!(
            err,
            ListingError::UnknownMnemonic {
                line: 3,
                mnemonic: "frobnicate".into(),
            }
        );

        let err = parse_listing("move v0, p1").unwrap_err();
        assert!(matches!(err, ListingError::BadOperand { line: 1, .. }));

        let err = parse_listing("const-string v0, \"open").unwrap_err();
        assert!(err.to_string().starts_with("line 1:"));
    }

    #[test]
    fn test_methods() {
        let source = r#"
            .class public Lcom/example/Foo;
            .super Ljava/lang/Object;

            .method public static a()V
                .registers 1
                nop
                return-void
            .end method

            .method private b(I)I
                .locals 0
                return v0
            .end method
        "#;
        let bodies = parse_methods(source).unwrap();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0].descriptor, "Lcom/example/Foo;->a()V");
        assert_eq!(bodies[0].instructions.len(), 2);
        assert_eq!(bodies[1].descriptor, "Lcom/example/Foo;->b(I)I");

        let bodies = parse_methods(".method static c()V\nreturn-void\n.end method").unwrap();
        assert_eq!(bodies[0].descriptor, "c()V");
    }

    #[test]
    fn test_methods_without_directives() {
        let bodies = parse_methods("nop\nreturn-void").unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].descriptor, "");
        assert_eq!(bodies[0].instructions.len(), 2);
    }

    #[test]
    fn test_method_structure_errors() {
        let err = parse_methods(".method a()V\n.method b()V").unwrap_err();
        assert_eq!(
            err,
            ListingError::Structure {
                line: 2,
                message: "nested .method",
            }
        );
        assert!(parse_methods(".method a()V\nnop").is_err());
        assert!(parse_methods("nop\n.method a()V\n.end method").is_err());
    }

    #[test]
    fn test_split_operands() {
        assert_eq!(split_operands("v0, {v1, v2}, \"x,y\""), vec!["v0", "{v1, v2}", "\"x,y\""]);
        assert!(split_operands("").is_empty());
    }
}
