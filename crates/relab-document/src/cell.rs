//! Cells: one narrative or executable unit of a document
//!
//! Cell order is semantically meaningful; later executable cells may depend
//! on earlier cells' side effects. On disk a narrative cell is an nbformat
//! `markdown` cell and an executable cell is a `code` cell.

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminant of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Markdown prose
    Narrative,
    /// Runnable source
    Executable,
}

/// Source text stored as nbformat line-list form
///
/// nbformat allows either a single string or a list of lines; we normalize to
/// the list form on construction and always serialize it that way, which is
/// what makes the round-trip byte-exact. Every line keeps its trailing
/// newline except (possibly) the last.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceText(Vec<String>);

impl SourceText {
    /// Build from flat text, splitting into newline-preserving lines
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            return Self(Vec::new());
        }
        Self(text.split_inclusive('\n').map(str::to_string).collect())
    }

    /// Stored lines
    #[inline]
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.0
    }

    /// Flat text
    #[must_use]
    pub fn as_text(&self) -> String {
        self.0.concat()
    }

    /// True when no source is present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for SourceText {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl Serialize for SourceText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for line in &self.0 {
            seq.serialize_element(line)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for SourceText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SourceVisitor;

        impl<'de> Visitor<'de> for SourceVisitor {
            type Value = SourceText;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a string or a list of source lines")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<SourceText, E> {
                Ok(SourceText::from_text(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<SourceText, A::Error> {
                let mut lines = Vec::new();
                while let Some(line) = seq.next_element::<String>()? {
                    lines.push(line);
                }
                Ok(SourceText(lines))
            }
        }

        deserializer.deserialize_any(SourceVisitor)
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// One unit of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type")]
pub enum Cell {
    /// Markdown prose cell
    #[serde(rename = "markdown")]
    Narrative {
        /// nbformat cell metadata (opaque, preserved)
        #[serde(default = "empty_object")]
        metadata: Value,
        /// Ordered source lines
        source: SourceText,
    },
    /// Executable source cell
    #[serde(rename = "code")]
    Executable {
        /// nbformat cell metadata (opaque, preserved)
        #[serde(default = "empty_object")]
        metadata: Value,
        /// Kernel execution counter, present after execution
        #[serde(default)]
        execution_count: Option<u64>,
        /// Captured outputs, present after execution
        #[serde(default)]
        outputs: Vec<Value>,
        /// Ordered source lines
        source: SourceText,
    },
}

impl Cell {
    /// New narrative cell from flat text
    #[must_use]
    pub fn narrative(text: &str) -> Self {
        Cell::Narrative {
            metadata: empty_object(),
            source: SourceText::from_text(text),
        }
    }

    /// New executable cell from flat text, no outputs yet
    #[must_use]
    pub fn executable(text: &str) -> Self {
        Cell::Executable {
            metadata: empty_object(),
            execution_count: None,
            outputs: Vec::new(),
            source: SourceText::from_text(text),
        }
    }

    /// Cell kind discriminant
    #[inline]
    #[must_use]
    pub fn kind(&self) -> CellKind {
        match self {
            Cell::Narrative { .. } => CellKind::Narrative,
            Cell::Executable { .. } => CellKind::Executable,
        }
    }

    /// True for executable cells
    #[inline]
    #[must_use]
    pub fn is_executable(&self) -> bool {
        matches!(self, Cell::Executable { .. })
    }

    /// Source text of the cell
    #[inline]
    #[must_use]
    pub fn source(&self) -> &SourceText {
        match self {
            Cell::Narrative { source, .. } | Cell::Executable { source, .. } => source,
        }
    }

    /// Replace the source text, leaving everything else untouched
    pub fn set_source(&mut self, text: &str) {
        match self {
            Cell::Narrative { source, .. } | Cell::Executable { source, .. } => {
                *source = SourceText::from_text(text);
            }
        }
    }

    /// Captured outputs (empty for narrative cells)
    #[must_use]
    pub fn outputs(&self) -> &[Value] {
        match self {
            Cell::Narrative { .. } => &[],
            Cell::Executable { outputs, .. } => outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_text_splits_preserving_newlines() {
        let src = SourceText::from_text("a = 1\nb = 2\n");
        assert_eq!(src.lines(), &["a = 1\n".to_string(), "b = 2\n".to_string()]);
        assert_eq!(src.as_text(), "a = 1\nb = 2\n");
    }

    #[test]
    fn source_text_without_trailing_newline() {
        let src = SourceText::from_text("a = 1\nb = 2");
        assert_eq!(src.lines().len(), 2);
        assert_eq!(src.as_text(), "a = 1\nb = 2");
    }

    #[test]
    fn source_text_accepts_string_form() {
        let src: SourceText = serde_json::from_value(json!("x = 1\ny = 2")).unwrap();
        assert_eq!(src.as_text(), "x = 1\ny = 2");
    }

    #[test]
    fn cell_serializes_with_nbformat_kinds() {
        let narrative = serde_json::to_value(Cell::narrative("# Title")).unwrap();
        assert_eq!(narrative["cell_type"], json!("markdown"));

        let code = serde_json::to_value(Cell::executable("x = 1")).unwrap();
        assert_eq!(code["cell_type"], json!("code"));
        assert_eq!(code["outputs"], json!([]));
        assert_eq!(code["execution_count"], json!(null));
    }

    #[test]
    fn set_source_replaces_only_source() {
        let mut cell = Cell::executable("broken()");
        cell.set_source("fixed()");
        assert_eq!(cell.source().as_text(), "fixed()");
        assert!(cell.outputs().is_empty());
    }

    #[test]
    fn reads_external_code_cell_with_outputs() {
        let raw = json!({
            "cell_type": "code",
            "execution_count": 3,
            "metadata": {},
            "outputs": [{"output_type": "stream", "name": "stdout", "text": ["hi\n"]}],
            "source": ["print('hi')\n"]
        });
        let cell: Cell = serde_json::from_value(raw).unwrap();
        assert!(cell.is_executable());
        assert_eq!(cell.outputs().len(), 1);
    }
}
