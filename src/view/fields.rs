use crate::model::{Entry, Field, FieldFormatting, FieldValueType, FormatOptions, GroupId, PropertyType};

pub const MASKED_VALUE: &str = "●●●●";
pub const NOT_SET_LABEL: &str = "Not set.";

/// How a field's value should be presented in read mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDisplay<'a> {
    /// One-time password URI; the renderer derives the digits.
    Otp { uri: &'a str },
    NotSet,
    /// Multi-line text shown verbatim.
    Note(&'a str),
    /// A select value, resolved to its label when the options carry labels.
    Choice { value: &'a str, label: &'a str },
    Masked,
    Plain { value: &'a str, format: Option<&'a str> },
}

impl FieldDisplay<'_> {
    pub fn text(&self) -> &str {
        match *self {
            FieldDisplay::Otp { uri } => uri,
            FieldDisplay::NotSet => NOT_SET_LABEL,
            FieldDisplay::Note(value) => value,
            FieldDisplay::Choice { label, .. } => label,
            FieldDisplay::Masked => MASKED_VALUE,
            FieldDisplay::Plain { value, .. } => value,
        }
    }
}

pub fn field_display(field: &Field, reveal: bool) -> FieldDisplay<'_> {
    if field.value_type == FieldValueType::Otp {
        return FieldDisplay::Otp { uri: &field.value };
    }
    if field.value.is_empty() {
        return FieldDisplay::NotSet;
    }
    if field.value_type == FieldValueType::Note {
        return FieldDisplay::Note(&field.value);
    }
    let formatting = field.formatting.as_ref();
    if let Some(options) = formatting.and_then(|formatting| formatting.options.as_ref()) {
        let label: &str = match options {
            FormatOptions::Labeled(labels) => labels
                .get(&field.value)
                .map(String::as_str)
                .unwrap_or(&field.value),
            FormatOptions::Values(_) => field.value.as_str(),
        };
        return FieldDisplay::Choice {
            value: &field.value,
            label,
        };
    }
    match field.value_type {
        FieldValueType::Password if !reveal => FieldDisplay::Masked,
        _ => FieldDisplay::Plain {
            value: &field.value,
            format: formatting.and_then(|formatting| formatting.format.as_deref()),
        },
    }
}

/// `(value, label)` pairs offered by a select input.
pub fn choice_options(formatting: &FieldFormatting) -> Vec<(&str, &str)> {
    match &formatting.options {
        Some(FormatOptions::Labeled(labels)) => labels
            .iter()
            .map(|(value, label)| (value.as_str(), label.as_str()))
            .collect(),
        Some(FormatOptions::Values(values)) => values
            .iter()
            .map(|value| (value.as_str(), value.as_str()))
            .collect(),
        None => Vec::new(),
    }
}

/// Notes that belong to the entry itself render without a label.
pub fn shows_label(field: &Field) -> bool {
    !(field.value_type == FieldValueType::Note && !field.removeable)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryLayout<'a> {
    pub main: Vec<&'a Field>,
    pub custom: Vec<&'a Field>,
}

impl EntryLayout<'_> {
    /// The custom section heading appears while editing or when it has rows.
    pub fn shows_custom_heading(&self, editing: bool) -> bool {
        editing || !self.custom.is_empty()
    }
}

/// Splits an entry's properties into the main form and the custom section.
/// Outside edit mode the title lives in the header, not the form.
pub fn layout_fields(entry: &Entry, editing: bool) -> EntryLayout<'_> {
    let (custom, main): (Vec<&Field>, Vec<&Field>) = entry
        .fields
        .iter()
        .filter(|field| field.property_type == PropertyType::Property)
        .filter(|field| editing || !field.is_title())
        .partition(|field| field.removeable);
    EntryLayout { main, custom }
}

/// Entries in the trash are read-only.
pub fn can_edit(entry: &Entry, trash_id: Option<&GroupId>) -> bool {
    trash_id.map_or(true, |trash| &entry.parent != trash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn with_options(field: Field, options: FormatOptions) -> Field {
        Field {
            formatting: Some(FieldFormatting {
                options: Some(options),
                ..FieldFormatting::default()
            }),
            ..field
        }
    }

    #[test]
    fn otp_wins_even_when_empty() {
        let field = Field::property("otp", "").with_value_type(FieldValueType::Otp);
        assert_eq!(field_display(&field, false), FieldDisplay::Otp { uri: "" });
    }

    #[test]
    fn empty_values_are_not_set() {
        let field = Field::property("password", "").with_value_type(FieldValueType::Password);
        assert_eq!(field_display(&field, false), FieldDisplay::NotSet);
        assert_eq!(field_display(&field, false).text(), NOT_SET_LABEL);
    }

    #[test]
    fn passwords_mask_until_revealed() {
        let field = Field::property("password", "hunter2").with_value_type(FieldValueType::Password);
        assert_eq!(field_display(&field, false), FieldDisplay::Masked);
        assert_eq!(
            field_display(&field, true),
            FieldDisplay::Plain {
                value: "hunter2",
                format: None
            }
        );
    }

    #[test]
    fn labeled_options_resolve_labels() {
        let mut labels = IndexMap::new();
        labels.insert("v".to_string(), "Visa".to_string());
        labels.insert("m".to_string(), "Mastercard".to_string());
        let field = with_options(Field::property("brand", "m"), FormatOptions::Labeled(labels));
        assert_eq!(field_display(&field, false).text(), "Mastercard");
        let formatting = field.formatting.as_ref().unwrap();
        assert_eq!(choice_options(formatting), vec![("v", "Visa"), ("m", "Mastercard")]);

        let unknown = Field {
            value: "x".into(),
            ..field.clone()
        };
        assert_eq!(field_display(&unknown, false).text(), "x");
    }

    #[test]
    fn note_keeps_newlines() {
        let field = Field::property("notes", "line one\nline two").with_value_type(FieldValueType::Note);
        assert_eq!(field_display(&field, false), FieldDisplay::Note("line one\nline two"));
        assert!(!shows_label(&field));
        assert!(shows_label(&field.clone().removeable()));
    }

    #[test]
    fn layout_hides_title_outside_edit_mode() {
        let entry = Entry::new("e1", "g1")
            .with_title("Mail")
            .with_field(Field::property("username", "jo"))
            .with_field(Field::property("pin", "1234").removeable())
            .with_field(Field::attribute("meta", "ignored"));

        let view = layout_fields(&entry, false);
        let main: Vec<&str> = view.main.iter().map(|f| f.property.as_str()).collect();
        assert_eq!(main, vec!["username"]);
        assert_eq!(view.custom.len(), 1);
        assert!(view.shows_custom_heading(false));

        let edit = layout_fields(&entry, true);
        let main: Vec<&str> = edit.main.iter().map(|f| f.property.as_str()).collect();
        assert_eq!(main, vec!["title", "username"]);
    }

    #[test]
    fn custom_heading_hidden_when_empty_in_view_mode() {
        let entry = Entry::new("e1", "g1").with_title("Mail");
        let view = layout_fields(&entry, false);
        assert!(!view.shows_custom_heading(false));
        assert!(view.shows_custom_heading(true));
    }

    #[test]
    fn trash_entries_are_read_only() {
        let trash = GroupId::from("t");
        assert!(!can_edit(&Entry::new("e1", "t"), Some(&trash)));
        assert!(can_edit(&Entry::new("e2", "g1"), Some(&trash)));
        assert!(can_edit(&Entry::new("e3", "t"), None));
    }
}
