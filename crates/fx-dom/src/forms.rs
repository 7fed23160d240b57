//! Form semantics: owner resolution and data collection.

use crate::{Document, NodeId};

impl Document {
    /// The form that owns `id`: itself if it is a form, the form named
    /// by its `form` attribute, or the nearest ancestor form.
    pub fn form_owner(&self, id: NodeId) -> Option<NodeId> {
        if self.tag_name(id) == Some("form") {
            return Some(id);
        }
        if let Some(name) = self.attribute(id, "form") {
            let owner = self.get_element_by_id(name)?;
            if self.tag_name(owner) == Some("form") {
                return Some(owner);
            }
            return None;
        }
        self.closest(id, "form")
    }

    /// Whether the element carries the `disabled` attribute.
    pub fn is_disabled(&self, id: NodeId) -> bool {
        self.has_attribute(id, "disabled")
    }

    /// Collects submittable control values from `form` in document
    /// order, the way form submission serializes them. `submitter`
    /// contributes its own name/value pair like a clicked button does.
    pub fn collect_form_data(&self, form: NodeId, submitter: Option<NodeId>) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for el in self.descendants(form) {
            let Some(tag) = self.tag_name(el) else {
                continue;
            };
            let Some(name) = self.attribute(el, "name") else {
                continue;
            };
            if name.is_empty() || self.is_disabled(el) {
                continue;
            }
            let name = name.to_string();
            match tag {
                "input" => {
                    let ty = self
                        .attribute(el, "type")
                        .map(|t| t.to_ascii_lowercase())
                        .unwrap_or_else(|| "text".to_string());
                    match ty.as_str() {
                        "submit" | "button" | "reset" | "image" => {
                            if submitter == Some(el) {
                                let value = self.attribute(el, "value").unwrap_or("").to_string();
                                out.push((name, value));
                            }
                        }
                        "checkbox" | "radio" => {
                            if self.has_attribute(el, "checked") {
                                let value =
                                    self.attribute(el, "value").unwrap_or("on").to_string();
                                out.push((name, value));
                            }
                        }
                        "file" => {}
                        _ => {
                            let value = self.attribute(el, "value").unwrap_or("").to_string();
                            out.push((name, value));
                        }
                    }
                }
                "button" => {
                    // Buttons default to type=submit.
                    let ty = self
                        .attribute(el, "type")
                        .map(|t| t.to_ascii_lowercase())
                        .unwrap_or_else(|| "submit".to_string());
                    if ty == "submit" && submitter == Some(el) {
                        let value = self.attribute(el, "value").unwrap_or("").to_string();
                        out.push((name, value));
                    }
                }
                "select" => {
                    let options: Vec<NodeId> = self
                        .descendants(el)
                        .into_iter()
                        .filter(|&o| self.tag_name(o) == Some("option"))
                        .collect();
                    let mut chosen: Vec<NodeId> = options
                        .iter()
                        .copied()
                        .filter(|&o| self.has_attribute(o, "selected"))
                        .collect();
                    if chosen.is_empty() && !self.has_attribute(el, "multiple") {
                        chosen.extend(options.first().copied());
                    }
                    for option in chosen {
                        let value = match self.attribute(option, "value") {
                            Some(v) => v.to_string(),
                            None => self.text_content(option).trim().to_string(),
                        };
                        out.push((name.clone(), value));
                    }
                }
                "textarea" => {
                    out.push((name, self.text_content(el)));
                }
                _ => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(doc: &mut Document, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let el = doc.create_element(tag);
        for (k, v) in attrs {
            doc.set_attribute(el, k, v).unwrap();
        }
        doc.append_child(parent, el).unwrap();
        el
    }

    #[test]
    fn test_form_owner_resolution() {
        let mut doc = Document::new();
        let root = doc.root();
        let form = build(&mut doc, root, "form", &[("id", "f")]);
        let inner = build(&mut doc, form, "input", &[("name", "a")]);
        let outside = build(&mut doc, root, "input", &[("form", "f"), ("name", "b")]);
        let stray = build(&mut doc, root, "input", &[("name", "c")]);

        assert_eq!(doc.form_owner(form), Some(form));
        assert_eq!(doc.form_owner(inner), Some(form));
        assert_eq!(doc.form_owner(outside), Some(form));
        assert_eq!(doc.form_owner(stray), None);
    }

    #[test]
    fn test_text_inputs_collected_in_order() {
        let mut doc = Document::new();
        let root = doc.root();
        let form = build(&mut doc, root, "form", &[]);
        build(&mut doc, form, "input", &[("name", "a"), ("value", "1")]);
        build(&mut doc, form, "input", &[("name", "b"), ("value", "2")]);
        build(&mut doc, form, "input", &[("value", "skipped")]);
        let data = doc.collect_form_data(form, None);
        assert_eq!(
            data,
            vec![("a".into(), "1".into()), ("b".into(), "2".into())]
        );
    }

    #[test]
    fn test_disabled_controls_skipped() {
        let mut doc = Document::new();
        let root = doc.root();
        let form = build(&mut doc, root, "form", &[]);
        build(
            &mut doc,
            form,
            "input",
            &[("name", "a"), ("value", "1"), ("disabled", "")],
        );
        assert!(doc.collect_form_data(form, None).is_empty());
    }

    #[test]
    fn test_checkbox_needs_checked() {
        let mut doc = Document::new();
        let root = doc.root();
        let form = build(&mut doc, root, "form", &[]);
        build(
            &mut doc,
            form,
            "input",
            &[("type", "checkbox"), ("name", "on_box"), ("checked", "")],
        );
        build(
            &mut doc,
            form,
            "input",
            &[("type", "checkbox"), ("name", "off_box")],
        );
        let data = doc.collect_form_data(form, None);
        assert_eq!(data, vec![("on_box".into(), "on".into())]);
    }

    #[test]
    fn test_submit_button_only_as_submitter() {
        let mut doc = Document::new();
        let root = doc.root();
        let form = build(&mut doc, root, "form", &[]);
        let save = build(
            &mut doc,
            form,
            "button",
            &[("name", "op"), ("value", "save")],
        );
        let del = build(
            &mut doc,
            form,
            "input",
            &[("type", "submit"), ("name", "op"), ("value", "delete")],
        );

        assert!(doc.collect_form_data(form, None).is_empty());
        assert_eq!(
            doc.collect_form_data(form, Some(save)),
            vec![("op".into(), "save".into())]
        );
        assert_eq!(
            doc.collect_form_data(form, Some(del)),
            vec![("op".into(), "delete".into())]
        );
    }

    #[test]
    fn test_select_value_fallbacks() {
        let mut doc = Document::new();
        let root = doc.root();
        let form = build(&mut doc, root, "form", &[]);
        let select = build(&mut doc, form, "select", &[("name", "pick")]);
        let first = build(&mut doc, select, "option", &[]);
        doc.set_text_content(first, "one").unwrap();
        let second = build(&mut doc, select, "option", &[("value", "2")]);
        doc.set_text_content(second, "two").unwrap();

        // No explicit selection: first option wins, text used as value.
        assert_eq!(
            doc.collect_form_data(form, None),
            vec![("pick".into(), "one".into())]
        );

        doc.set_attribute(second, "selected", "").unwrap();
        assert_eq!(
            doc.collect_form_data(form, None),
            vec![("pick".into(), "2".into())]
        );
    }

    #[test]
    fn test_textarea_uses_content() {
        let mut doc = Document::new();
        let root = doc.root();
        let form = build(&mut doc, root, "form", &[]);
        let area = build(&mut doc, form, "textarea", &[("name", "note")]);
        doc.set_text_content(area, "hello").unwrap();
        assert_eq!(
            doc.collect_form_data(form, None),
            vec![("note".into(), "hello".into())]
        );
    }
}
