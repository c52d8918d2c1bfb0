//! Built-in specifications for benchmark rows whose spec column reads
//! `inline:<name>`. They are written next to the fixture's artifacts before
//! timing starts.

/// Catalog prefix selecting a built-in template instead of a spec file.
pub const INLINE_PREFIX: &str = "inline:";

const EXPR_SUBSET_A: &str = "\
meta:
  id: expr_subset_a
  endian: le
seq:
  - id: a
    type: u1
  - id: b
    type: u1
instances:
  lit:
    value: 7
  arith:
    value: a + b * 3 - 2
  logic:
    value: (a > b) and (lit == 7)
  ref_mix:
    value: lit + a
";

const TYPE_SUBSET: &str = "\
meta:
  id: type_subset
  endian: le
seq:
  - id: u
    type: u4
  - id: s
    type: s2
  - id: f
    type: f4
  - id: bytes_fixed
    size: 4
  - id: txt
    type: str
    size: 3
    encoding: UTF-8
";

const TEMPLATES: &[(&str, &str)] = &[("expr_subset_a", EXPR_SUBSET_A), ("type_subset", TYPE_SUBSET)];

/// Look up a template by name.
#[must_use]
pub fn inline_template(name: &str) -> Option<&'static str> {
    TEMPLATES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, text)| *text)
}

/// Names accepted after [`INLINE_PREFIX`].
pub fn template_names() -> impl Iterator<Item = &'static str> {
    TEMPLATES.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_declare_their_own_id() {
        for name in template_names() {
            let text = inline_template(name).unwrap();
            assert!(text.starts_with("meta:\n"), "{name}");
            assert!(text.contains(&format!("  id: {name}\n")), "{name}");
            assert!(text.ends_with('\n') && !text.ends_with("\n\n"), "{name}");
        }
    }

    #[test]
    fn unknown_names_have_no_template() {
        assert!(inline_template("expr_subset_b").is_none());
        assert!(inline_template("").is_none());
    }
}
