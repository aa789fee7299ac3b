//! Events command implementation

use anyhow::{Context, Result};
use scoped_xml::{EventHandler, RawAttribute, read_events};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

pub fn execute(input: &Path) -> Result<()> {
    let file =
        File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let stdout = std::io::stdout();
    let mut log = EventLog::new(stdout.lock());
    read_events(BufReader::new(file), &mut log)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    Ok(())
}

/// Writes one indented line per event.
pub struct EventLog<W: Write> {
    out: W,
    depth: usize,
}

impl<W: Write> EventLog<W> {
    pub fn new(out: W) -> Self {
        Self { out, depth: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) -> scoped_xml::Result<()> {
        writeln!(self.out, "{:indent$}{}", "", text, indent = self.depth * 2)?;
        Ok(())
    }
}

impl<W: Write> EventHandler for EventLog<W> {
    fn start_document(&mut self) -> scoped_xml::Result<()> {
        self.line("start-document")
    }

    fn end_document(&mut self) -> scoped_xml::Result<()> {
        self.line("end-document")?;
        self.out.flush()?;
        Ok(())
    }

    fn start_prefix_mapping(&mut self, prefix: &str, namespace: &str) -> scoped_xml::Result<()> {
        self.line(&format!("prefix-mapping {:?} -> {:?}", prefix, namespace))
    }

    fn end_prefix_mapping(&mut self, prefix: &str) -> scoped_xml::Result<()> {
        self.line(&format!("end-prefix-mapping {:?}", prefix))
    }

    fn start_element(&mut self, name: &str, attributes: &[RawAttribute]) -> scoped_xml::Result<()> {
        let mut text = format!("start-element {}", name);
        for attribute in attributes {
            text.push_str(&format!(" {}={:?}", attribute.name, attribute.value));
        }
        self.line(&text)?;
        self.depth += 1;
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> scoped_xml::Result<()> {
        self.depth = self.depth.saturating_sub(1);
        self.line(&format!("end-element {}", name))
    }

    fn characters(&mut self, text: &str) -> scoped_xml::Result<()> {
        self.line(&format!("characters {:?}", text))
    }

    fn start_cdata(&mut self) -> scoped_xml::Result<()> {
        self.line("start-cdata")
    }

    fn end_cdata(&mut self) -> scoped_xml::Result<()> {
        self.line("end-cdata")
    }

    fn comment(&mut self, text: &str) -> scoped_xml::Result<()> {
        self.line(&format!("comment {:?}", text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_event_lines() {
        let mut log = EventLog::new(Vec::new());
        read_events(r#"<p:a xmlns:p="urn:p" k="v">x<![CDATA[y]]></p:a>"#.as_bytes(), &mut log)
            .unwrap();
        let output = String::from_utf8(log.into_inner()).unwrap();
        let expected = [
            "start-document",
            r#"prefix-mapping "p" -> "urn:p""#,
            r#"start-element p:a xmlns:p="urn:p" k="v""#,
            r#"  characters "x""#,
            "  start-cdata",
            r#"  characters "y""#,
            "  end-cdata",
            "end-element p:a",
            r#"end-prefix-mapping "p""#,
            "end-document",
        ];
        assert_eq!(output.lines().collect::<Vec<_>>(), expected);
    }
}
