use crate::model::{Field, HistoryItem};

/// Previous values of `field`, oldest first.
///
/// The newest change is dropped when it only restates the live value.
pub fn history_for_field<'a>(history: &'a [HistoryItem], field: &Field) -> Vec<&'a HistoryItem> {
    let mut items: Vec<&HistoryItem> = history
        .iter()
        .filter(|item| field.same_key(&item.property, item.property_type))
        .collect();
    if items
        .last()
        .is_some_and(|last| last.new_value.as_deref() == Some(field.value.as_str()))
    {
        items.pop();
    }
    items
}
