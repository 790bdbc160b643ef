//! Request/response boundary over explicit document handles.
//!
//! A [`Session`] owns every document opened through it and hands out
//! numeric handles. Each request line is a JSON object tagged with `op`;
//! each response line is `{"status": "ok", "result": ...}` or
//! `{"status": "error", "kind": ..., "message": ...}`. Requests run one at a
//! time, in arrival order.

use crate::accessors::{set_core_property, set_custom_property};
use crate::apply::{apply, ApplyOptions};
use crate::content::{self, RunFormat};
use crate::error::{Error, ErrorKind, Result};
use crate::extract::{extract, ExtractOptions, Extraction};
use crate::model::{Alignment, Document};
use crate::schema::{Category, ParameterSchema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Numeric document handle.
pub type Handle = u64;

fn default_level() -> u8 {
    1
}

fn default_true() -> bool {
    true
}

fn default_custom_type() -> String {
    "string".to_string()
}

/// One named call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateDocument {
        #[serde(default)]
        filename: Option<String>,
    },
    LoadTemplate {
        filename: String,
    },
    SaveDocument {
        handle: Handle,
        #[serde(default)]
        filename: Option<String>,
    },
    CloseDocument {
        handle: Handle,
    },
    AddHeading {
        handle: Handle,
        text: String,
        #[serde(default = "default_level")]
        level: u8,
        #[serde(default)]
        font_size: Option<f64>,
    },
    AddParagraph {
        handle: Handle,
        text: String,
        #[serde(default)]
        alignment: Option<Alignment>,
        #[serde(default = "default_true")]
        indent_first_line: bool,
    },
    AddFormattedText {
        handle: Handle,
        paragraph_index: isize,
        text: String,
        #[serde(default)]
        bold: bool,
        #[serde(default)]
        italic: bool,
        #[serde(default)]
        font_size: Option<f64>,
        #[serde(default)]
        lang: Option<String>,
    },
    AddListItem {
        handle: Handle,
        text: String,
        #[serde(default)]
        style: Option<String>,
    },
    ExtractDocumentParameters {
        #[serde(default)]
        handle: Option<Handle>,
        #[serde(default)]
        filename: Option<String>,
        #[serde(default)]
        compact: bool,
        #[serde(default)]
        all_styles: bool,
        #[serde(default)]
        include_cell_text: bool,
    },
    ExtractCoreProperties {
        #[serde(default)]
        handle: Option<Handle>,
        #[serde(default)]
        filename: Option<String>,
    },
    ExtractCustomProperties {
        #[serde(default)]
        handle: Option<Handle>,
        #[serde(default)]
        filename: Option<String>,
    },
    ExtractDocumentVariables {
        #[serde(default)]
        handle: Option<Handle>,
        #[serde(default)]
        filename: Option<String>,
    },
    ExtractSectionProperties {
        #[serde(default)]
        handle: Option<Handle>,
        #[serde(default)]
        filename: Option<String>,
    },
    ExtractStylesInfo {
        #[serde(default)]
        handle: Option<Handle>,
        #[serde(default)]
        filename: Option<String>,
        #[serde(default)]
        compact: bool,
        #[serde(default)]
        all_styles: bool,
    },
    /// Build a new document from parameters, given as an object or as a
    /// JSON string.
    ApplyTemplateParameters {
        parameters: Value,
        #[serde(default)]
        output_filename: Option<String>,
    },
    SetCoreProperty {
        handle: Handle,
        property_name: String,
        value: String,
    },
    SetCustomProperty {
        handle: Handle,
        property_name: String,
        value: String,
        #[serde(rename = "type", default = "default_custom_type")]
        kind: String,
    },
    GetDocumentStructure {
        #[serde(default)]
        handle: Option<Handle>,
        #[serde(default)]
        filename: Option<String>,
    },
}

/// Outcome of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok { result: Value },
    Error { kind: ErrorKind, message: String },
}

impl Response {
    pub fn from_result(result: Result<Value>) -> Self {
        match result {
            Ok(result) => Response::Ok { result },
            Err(err) => Response::Error {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

struct OpenDocument {
    doc: Document,
    path: Option<PathBuf>,
}

/// Open documents keyed by handle.
#[derive(Default)]
pub struct Session {
    documents: BTreeMap<Handle, OpenDocument>,
    next_handle: Handle,
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::Serialization(e.to_string()))
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Borrow an open document.
    pub fn document(&self, handle: Handle) -> Result<&Document> {
        self.documents
            .get(&handle)
            .map(|d| &d.doc)
            .ok_or_else(|| unknown_handle(handle))
    }

    pub fn document_mut(&mut self, handle: Handle) -> Result<&mut Document> {
        self.documents
            .get_mut(&handle)
            .map(|d| &mut d.doc)
            .ok_or_else(|| unknown_handle(handle))
    }

    /// Take ownership of a document and return its handle.
    pub fn insert(&mut self, doc: Document, path: Option<PathBuf>) -> Handle {
        self.next_handle += 1;
        let handle = self.next_handle;
        self.documents.insert(handle, OpenDocument { doc, path });
        handle
    }

    /// The document a read-only call targets: a file when given, else a handle.
    fn source(&self, handle: Option<Handle>, filename: Option<&str>) -> Result<Cow<'_, Document>> {
        match (filename, handle) {
            (Some(filename), _) => Ok(Cow::Owned(Document::open(filename)?)),
            (None, Some(handle)) => Ok(Cow::Borrowed(self.document(handle)?)),
            (None, None) => Err(Error::validation(
                "provide a document handle or a filename",
            )),
        }
    }

    fn source_name(&self, handle: Option<Handle>, filename: Option<&str>) -> Option<String> {
        filename.map(str::to_string).or_else(|| {
            handle
                .and_then(|h| self.documents.get(&h))
                .and_then(|d| d.path.as_ref())
                .map(|p| p.display().to_string())
        })
    }

    fn extract_category(
        &self,
        handle: Option<Handle>,
        filename: Option<&str>,
        category: Category,
    ) -> Result<Value> {
        let doc = self.source(handle, filename)?;
        let schema = extract(&doc, &ExtractOptions::new().with_categories([category]))?;
        let value = to_value(&schema)?;
        Ok(value.get(category.as_str()).cloned().unwrap_or(Value::Null))
    }

    /// Execute one request.
    pub fn handle(&mut self, request: Request) -> Result<Value> {
        match request {
            Request::CreateDocument { filename } => {
                let doc = content::create_document()?;
                let handle = self.insert(doc, filename.map(PathBuf::from));
                Ok(json!({ "handle": handle }))
            }
            Request::LoadTemplate { filename } => {
                let doc = Document::open(&filename)?;
                let handle = self.insert(doc, Some(PathBuf::from(filename)));
                Ok(json!({ "handle": handle }))
            }
            Request::SaveDocument { handle, filename } => {
                let open = self
                    .documents
                    .get_mut(&handle)
                    .ok_or_else(|| unknown_handle(handle))?;
                let path = filename
                    .map(PathBuf::from)
                    .or_else(|| open.path.clone())
                    .ok_or_else(|| Error::validation("no filename given for this document"))?;
                open.doc.save(&path)?;
                open.path = Some(path.clone());
                Ok(json!({ "path": path.display().to_string() }))
            }
            Request::CloseDocument { handle } => {
                self.documents
                    .remove(&handle)
                    .ok_or_else(|| unknown_handle(handle))?;
                Ok(json!({ "closed": handle }))
            }
            Request::AddHeading {
                handle,
                text,
                level,
                font_size,
            } => {
                content::add_heading(self.document_mut(handle)?, &text, level, font_size)?;
                Ok(json!({ "level": level }))
            }
            Request::AddParagraph {
                handle,
                text,
                alignment,
                indent_first_line,
            } => {
                let doc = self.document_mut(handle)?;
                content::add_paragraph(doc, &text, alignment, indent_first_line);
                Ok(json!({ "index": doc.paragraph_count() - 1 }))
            }
            Request::AddFormattedText {
                handle,
                paragraph_index,
                text,
                bold,
                italic,
                font_size,
                lang,
            } => {
                let format = RunFormat {
                    bold,
                    italic,
                    font_size,
                    lang,
                };
                content::add_formatted_text(
                    self.document_mut(handle)?,
                    paragraph_index,
                    &text,
                    &format,
                )?;
                Ok(json!({ "paragraph_index": paragraph_index }))
            }
            Request::AddListItem {
                handle,
                text,
                style,
            } => {
                content::add_list_item(self.document_mut(handle)?, &text, style.as_deref())?;
                Ok(json!({ "added": true }))
            }
            Request::ExtractDocumentParameters {
                handle,
                filename,
                compact,
                all_styles,
                include_cell_text,
            } => {
                let options = ExtractOptions::new()
                    .with_compact(compact)
                    .with_all_styles(all_styles)
                    .with_cell_text(include_cell_text);
                let doc = self.source(handle, filename.as_deref())?;
                let source = self.source_name(handle, filename.as_deref());
                to_value(&Extraction::run(&doc, source, &options)?)
            }
            Request::ExtractCoreProperties { handle, filename } => {
                self.extract_category(handle, filename.as_deref(), Category::CoreProperties)
            }
            Request::ExtractCustomProperties { handle, filename } => {
                self.extract_category(handle, filename.as_deref(), Category::CustomProperties)
            }
            Request::ExtractDocumentVariables { handle, filename } => {
                self.extract_category(handle, filename.as_deref(), Category::Variables)
            }
            Request::ExtractSectionProperties { handle, filename } => {
                self.extract_category(handle, filename.as_deref(), Category::Sections)
            }
            Request::ExtractStylesInfo {
                handle,
                filename,
                compact,
                all_styles,
            } => {
                let doc = self.source(handle, filename.as_deref())?;
                let options = ExtractOptions::new()
                    .with_categories([Category::Styles])
                    .with_compact(compact)
                    .with_all_styles(all_styles);
                to_value(&extract(&doc, &options)?.styles)
            }
            Request::ApplyTemplateParameters {
                parameters,
                output_filename,
            } => {
                let schema = match parameters {
                    Value::String(text) => ParameterSchema::from_json(&text)?,
                    other => serde_json::from_value(other)?,
                };
                let mut doc = Document::new();
                let report = apply(&schema, &mut doc, &ApplyOptions::default())?;
                let handle = self.insert(doc, output_filename.map(PathBuf::from));
                Ok(json!({ "handle": handle, "report": report }))
            }
            Request::SetCoreProperty {
                handle,
                property_name,
                value,
            } => {
                set_core_property(self.document_mut(handle)?, &property_name, &value)?;
                Ok(json!({ "property": property_name, "value": value }))
            }
            Request::SetCustomProperty {
                handle,
                property_name,
                value,
                kind,
            } => {
                let doc = self.document_mut(handle)?;
                set_custom_property(doc, &property_name, &value, &kind)?;
                to_value(&doc.custom.get(&property_name))
            }
            Request::GetDocumentStructure { handle, filename } => {
                let doc = self.source(handle, filename.as_deref())?;
                to_value(&content::document_structure(&doc))
            }
        }
    }

    /// Map one request line to one response line.
    pub fn handle_line(&mut self, line: &str) -> String {
        log::debug!("request line of {} bytes", line.len());
        let result = serde_json::from_str::<Request>(line)
            .map_err(Error::from)
            .and_then(|request| self.handle(request));
        if let Err(err) = &result {
            log::warn!("request failed: {}", err);
        }
        let response = Response::from_result(result);
        serde_json::to_string(&response).unwrap_or_else(|e| {
            format!(
                "{{\"status\":\"error\",\"kind\":\"serialization_error\",\"message\":{:?}}}",
                e.to_string()
            )
        })
    }

    /// Serve requests line by line until the input ends.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            writeln!(output, "{}", self.handle_line(&line))?;
            output.flush()?;
        }
        Ok(())
    }
}

fn unknown_handle(handle: Handle) -> Error {
    Error::UnknownReference(format!("document handle {}", handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(response: &str) -> Value {
        let value: Value = serde_json::from_str(response).unwrap();
        assert_eq!(value["status"], "ok", "{response}");
        value["result"].clone()
    }

    #[test]
    fn test_create_and_edit_by_handle() {
        let mut session = Session::new();
        let created = ok(&session.handle_line(r#"{"op": "create_document"}"#));
        let handle = created["handle"].as_u64().unwrap();

        ok(&session.handle_line(&format!(
            r#"{{"op": "add_heading", "handle": {handle}, "text": "Intro"}}"#
        )));
        ok(&session.handle_line(&format!(
            r#"{{"op": "add_paragraph", "handle": {handle}, "text": "Body text"}}"#
        )));
        let structure = ok(&session.handle_line(&format!(
            r#"{{"op": "get_document_structure", "handle": {handle}}}"#
        )));
        assert_eq!(structure["headings"][0]["text"], "Intro");
        assert_eq!(structure["paragraphs"][0]["text_preview"], "Body text");
    }

    #[test]
    fn test_errors_are_structured() {
        let mut session = Session::new();
        let response: Value =
            serde_json::from_str(&session.handle_line(r#"{"op": "close_document", "handle": 9}"#))
                .unwrap();
        assert_eq!(response["status"], "error");
        assert_eq!(response["kind"], "unknown_reference");

        let response: Value =
            serde_json::from_str(&session.handle_line(r#"{"op": "no_such_call"}"#)).unwrap();
        assert_eq!(response["kind"], "validation_error");

        let response: Value = serde_json::from_str(
            &session.handle_line(r#"{"op": "extract_core_properties"}"#),
        )
        .unwrap();
        assert_eq!(response["kind"], "validation_error");
    }

    #[test]
    fn test_apply_template_parameters_from_string() {
        let mut session = Session::new();
        let request = json!({
            "op": "apply_template_parameters",
            "parameters": r#"{"core_properties": {"title": "From template"}}"#,
        });
        let result = ok(&session.handle_line(&request.to_string()));
        let handle = result["handle"].as_u64().unwrap();
        assert_eq!(result["report"]["properties"], 1);
        assert_eq!(
            session.document(handle).unwrap().core.title.as_deref(),
            Some("From template")
        );
    }

    #[test]
    fn test_set_properties_and_extract_them() {
        let mut session = Session::new();
        let handle = session.insert(Document::new(), None);
        ok(&session.handle_line(&format!(
            r#"{{"op": "set_core_property", "handle": {handle}, "property_name": "author", "value": "R. Vega"}}"#
        )));
        let custom = ok(&session.handle_line(&format!(
            r#"{{"op": "set_custom_property", "handle": {handle}, "property_name": "Pages", "value": "4", "type": "number"}}"#
        )));
        assert_eq!(custom, json!({"type": "number", "value": 4.0}));

        let core = ok(&session.handle_line(&format!(
            r#"{{"op": "extract_core_properties", "handle": {handle}}}"#
        )));
        assert_eq!(core["author"], "R. Vega");
    }

    #[test]
    fn test_serve_loop() {
        let mut session = Session::new();
        let input = "{\"op\": \"create_document\"}\n\n{\"op\": \"close_document\", \"handle\": 1}\n";
        let mut output = Vec::new();
        session.serve(input.as_bytes(), &mut output).unwrap();
        let lines: Vec<&str> = std::str::from_utf8(&output).unwrap().lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(session.is_empty());
    }
}
