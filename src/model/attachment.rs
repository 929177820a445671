use serde::{Deserialize, Serialize};

use super::{Entry, PropertyType};

/// Attribute prefix under which attachment descriptors are stored on an entry.
pub const ATTACHMENT_ATTRIBUTE_PREFIX: &str = "BC_ENTRY_ATTACHMENT:";

const IEC_UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentIcon {
    Media,
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

impl Attachment {
    pub fn icon(&self) -> AttachmentIcon {
        if self.mime_type.starts_with("image/") {
            AttachmentIcon::Media
        } else {
            AttachmentIcon::Document
        }
    }

    pub fn size_friendly(&self) -> String {
        format_size_iec(self.size)
    }
}

/// Decodes the attachment descriptors of an entry in field order.
pub fn attachments(entry: &Entry) -> Vec<Attachment> {
    entry
        .fields
        .iter()
        .filter(|field| {
            field.property_type == PropertyType::Attribute
                && field.property.starts_with(ATTACHMENT_ATTRIBUTE_PREFIX)
        })
        .filter_map(|field| match serde_json::from_str::<Attachment>(&field.value) {
            Ok(attachment) => Some(attachment),
            Err(err) => {
                tracing::warn!(
                    ?err,
                    entry = %entry.id,
                    attribute = %field.property,
                    "skipping unreadable attachment descriptor"
                );
                None
            }
        })
        .collect()
}

pub fn format_size_iec(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < IEC_UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", IEC_UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;

    fn attachment_field(key: &str, body: &str) -> Field {
        Field::attribute(format!("{ATTACHMENT_ATTRIBUTE_PREFIX}{key}"), body)
    }

    #[test]
    fn decodes_attachments_in_field_order() {
        let entry = Entry::new("e1", "g1")
            .with_title("Passport")
            .with_field(attachment_field(
                "a1",
                r#"{"id":"a1","name":"scan.png","type":"image/png","size":2048}"#,
            ))
            .with_field(Field::attribute("unrelated", "x"))
            .with_field(attachment_field(
                "a2",
                r#"{"id":"a2","name":"notes.pdf","type":"application/pdf","size":100}"#,
            ));

        let found = attachments(&entry);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "scan.png");
        assert_eq!(found[0].icon(), AttachmentIcon::Media);
        assert_eq!(found[0].size_friendly(), "2.00 KiB");
        assert_eq!(found[1].icon(), AttachmentIcon::Document);
        assert_eq!(found[1].size_friendly(), "100 B");
    }

    #[test]
    fn property_fields_with_prefix_are_not_attachments() {
        let entry = Entry::new("e1", "g1").with_field(Field::property(
            format!("{ATTACHMENT_ATTRIBUTE_PREFIX}a1"),
            r#"{"id":"a1","name":"x","type":"text/plain","size":1}"#,
        ));
        assert!(attachments(&entry).is_empty());
    }

    #[test]
    fn malformed_descriptor_is_skipped() {
        let entry = Entry::new("e1", "g1")
            .with_field(attachment_field("bad", "{not json"))
            .with_field(attachment_field(
                "ok",
                r#"{"id":"ok","name":"ok.txt","type":"text/plain","size":5}"#,
            ));
        let found = attachments(&entry);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "ok");
    }

    #[test]
    fn iec_sizes_scale_through_units() {
        assert_eq!(format_size_iec(0), "0 B");
        assert_eq!(format_size_iec(1023), "1023 B");
        assert_eq!(format_size_iec(1536), "1.50 KiB");
        assert_eq!(format_size_iec(5 * 1024 * 1024), "5.00 MiB");
    }
}
