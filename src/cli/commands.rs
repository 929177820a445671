use std::collections::HashSet;
use std::fmt::Write as _;

use anyhow::{anyhow, bail, Result};
use clap::{Args, Subcommand};

use crate::config::AppConfig;
use crate::error::VaultError;
use crate::model::{
    attachments as entry_attachments, AttachmentIcon, Entry, EntryId, Field, GroupId, PropertyType,
};
use crate::store::{MemoryVault, TrashOutcome, VaultActions, VaultStore};
use crate::view::{
    build_visible_group_tree, can_edit, entries_in_group, entries_under, field_display, find_trash_group,
    groups_under, history_for_field, layout_fields, project_entries, shows_label, trash_count, GroupNode,
    SortMode,
};

/// Text produced by a command and whether the vault needs writing back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub text: String,
    pub modified: bool,
}

impl Report {
    pub fn view(text: String) -> Self {
        Self {
            text,
            modified: false,
        }
    }

    fn changed(text: String) -> Self {
        Self {
            text,
            modified: true,
        }
    }
}

fn parse_sort_mode(raw: &str) -> Result<SortMode, VaultError> {
    SortMode::parse(raw)
}

#[derive(Args, Debug, Clone, Default)]
pub struct GroupsArgs {
    /// Group to mark as selected; its ancestors are opened
    #[arg(long)]
    pub selected: Option<String>,
    /// Groups to expand (repeatable)
    #[arg(long = "expand")]
    pub expanded: Vec<String>,
    /// Sort mode: az sorts by title, na and za keep vault order (overrides config)
    #[arg(long, value_parser = parse_sort_mode)]
    pub sort: Option<SortMode>,
    /// Case-insensitive title filter (overrides config)
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EntriesArgs {
    /// Group whose direct entries are listed
    pub group: String,
    /// Sort mode: na, az or za (overrides config)
    #[arg(long, value_parser = parse_sort_mode)]
    pub sort: Option<SortMode>,
    /// Case-insensitive title filter (overrides config)
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct FieldsArgs {
    /// Entry identifier
    pub entry: String,
    /// Lay fields out as the edit form does
    #[arg(long)]
    pub edit: bool,
    /// Show password values in clear text
    #[arg(long)]
    pub reveal: bool,
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Entry identifier
    pub entry: String,
    /// Field property name
    pub field: String,
    /// Look up an attribute instead of a property
    #[arg(long)]
    pub attribute: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RestoreArgs {
    /// Entry identifier
    pub entry: String,
    /// Field property name
    pub field: String,
    /// Position in the `history` listing (1 = oldest)
    pub index: usize,
    /// Look up an attribute instead of a property
    #[arg(long)]
    pub attribute: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AttachmentsArgs {
    /// Entry identifier
    pub entry: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TrashCommand {
    /// Summarise the trash group
    Show,
    /// Move an entry into the trash
    Entry { id: String },
    /// Move a group (and everything below it) into the trash
    Group { id: String },
    /// Permanently delete everything inside the trash
    Empty {
        /// Only report what would be deleted
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct TrashArgs {
    #[command(subcommand)]
    pub command: TrashCommand,
}

pub fn groups(vault: &MemoryVault, config: &AppConfig, args: &GroupsArgs) -> String {
    let selected = args.selected.as_deref().map(GroupId::from);
    let expanded: HashSet<GroupId> = args.expanded.iter().map(|id| GroupId::from(id.as_str())).collect();
    let sort_mode = args.sort.unwrap_or(config.groups.sort_mode);
    let term = args.filter.as_deref().unwrap_or(&config.groups.term);
    let nodes = build_visible_group_tree(vault.groups(), selected.as_ref(), &expanded, sort_mode, term);
    render_group_tree(&nodes)
}

pub fn render_group_tree(nodes: &[GroupNode<'_>]) -> String {
    let mut out = String::new();
    for node in nodes {
        let _ = write!(out, "{:indent$}{}", "", node.group.title, indent = node.depth * 2);
        if node.has_children && !node.is_expanded {
            out.push_str(" [+]");
        }
        if node.group.is_trash() {
            out.push_str(" [trash]");
        }
        if node.detached {
            out.push_str(" [detached]");
        }
        if node.is_selected {
            out.push_str(" *");
        }
        out.push('\n');
    }
    out
}

pub fn entries(vault: &MemoryVault, config: &AppConfig, args: &EntriesArgs) -> String {
    let group = GroupId::from(args.group.as_str());
    let sort_mode = args.sort.unwrap_or(config.entries.sort_mode);
    let term = args.filter.as_deref().unwrap_or(&config.entries.term);
    let members = entries_in_group(vault.entries(), &group);
    let visible = project_entries(members, sort_mode, term);
    if visible.is_empty() {
        return format!("No entries in group {group}.\n");
    }
    let mut out = String::new();
    for entry in visible {
        let _ = writeln!(out, "{}\t{}", entry.id, entry.display_title());
    }
    out
}

pub fn fields(vault: &MemoryVault, config: &AppConfig, args: &FieldsArgs) -> Result<String> {
    let entry = lookup_entry(vault, &args.entry)?;
    let reveal = args.reveal || config.display.reveal_passwords;
    let trash = find_trash_group(vault.groups()).map(|group| &group.id);
    let layout = layout_fields(entry, args.edit);

    let mut out = String::new();
    let heading = if args.edit { "Edit Document" } else { entry.display_title() };
    let _ = writeln!(out, "# {heading}");
    for field in &layout.main {
        write_field_row(&mut out, field, reveal);
    }
    if layout.shows_custom_heading(args.edit) {
        out.push_str("-- Custom Fields --\n");
        for field in &layout.custom {
            write_field_row(&mut out, field, reveal);
        }
    }
    if !args.edit {
        out.push_str("-- Attachments --\n");
        for attachment in entry_attachments(entry) {
            let kind = match attachment.icon() {
                AttachmentIcon::Media => "media",
                AttachmentIcon::Document => "document",
            };
            let _ = writeln!(out, "{} ({}, {kind})", attachment.name, attachment.size_friendly());
        }
        if !can_edit(entry, trash) {
            out.push_str("(in trash, read-only)\n");
        }
    }
    Ok(out)
}

fn write_field_row(out: &mut String, field: &Field, reveal: bool) {
    let display = field_display(field, reveal);
    if shows_label(field) {
        let _ = writeln!(out, "{}: {}", field.label(), display.text());
    } else {
        let _ = writeln!(out, "{}", display.text());
    }
}

pub fn history(vault: &MemoryVault, args: &HistoryArgs) -> Result<String> {
    let entry = lookup_entry(vault, &args.entry)?;
    let field = lookup_field(entry, &args.field, args.attribute)?;
    let items = history_for_field(&entry.history, field);
    if items.is_empty() {
        return Ok(format!("No history for field '{}'.\n", field.property));
    }
    let mut out = String::new();
    for (idx, item) in items.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", idx + 1, item.new_value.as_deref().unwrap_or(""));
    }
    Ok(out)
}

pub fn restore(vault: &mut MemoryVault, args: &RestoreArgs) -> Result<Report> {
    let entry = lookup_entry(vault, &args.entry)?;
    let field = lookup_field(entry, &args.field, args.attribute)?.clone();
    let items = history_for_field(&entry.history, &field);
    let Some(item) = args.index.checked_sub(1).and_then(|idx| items.get(idx)) else {
        bail!(
            "history position {} out of range (field '{}' has {} previous value(s))",
            args.index,
            field.property,
            items.len()
        );
    };
    let value = item.new_value.clone().unwrap_or_default();
    let entry_id = entry.id.clone();
    VaultActions::new(vault).restore_field_value(&entry_id, &field, &value)?;
    Ok(Report::changed(format!(
        "Restored '{}' on entry {entry_id}.\n",
        field.property
    )))
}

pub fn attachments(vault: &MemoryVault, args: &AttachmentsArgs) -> Result<String> {
    let entry = lookup_entry(vault, &args.entry)?;
    let found = entry_attachments(entry);
    if found.is_empty() {
        return Ok("No attachments.\n".to_string());
    }
    let mut out = String::new();
    for attachment in found {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}",
            attachment.id,
            attachment.name,
            attachment.mime_type,
            attachment.size_friendly()
        );
    }
    Ok(out)
}

pub fn trash(vault: &mut MemoryVault, args: TrashArgs) -> Result<Report> {
    match args.command {
        TrashCommand::Show => Ok(Report::view(trash_summary(vault))),
        TrashCommand::Entry { id } => {
            let outcome = VaultActions::new(vault).move_entry_to_trash(&EntryId::from(id.as_str()))?;
            Ok(outcome_report(outcome, &format!("entry {id}")))
        }
        TrashCommand::Group { id } => {
            let outcome = VaultActions::new(vault).move_group_to_trash(&GroupId::from(id.as_str()))?;
            Ok(outcome_report(outcome, &format!("group {id}")))
        }
        TrashCommand::Empty { dry_run: true } => {
            let Some(trash) = find_trash_group(vault.groups()) else {
                return Ok(Report::view(NO_TRASH.to_string()));
            };
            let (groups, entries) = purge_counts(vault, &trash.id);
            Ok(Report::view(format!(
                "Would delete {groups} group(s) and {entries} entry item(s).\n"
            )))
        }
        TrashCommand::Empty { dry_run: false } => {
            let outcome = VaultActions::new(vault).empty_trash()?;
            Ok(outcome_report(outcome, "trash"))
        }
    }
}

const NO_TRASH: &str = "No trash group in vault.\n";

fn trash_summary(vault: &MemoryVault) -> String {
    let Some(trash) = find_trash_group(vault.groups()) else {
        return NO_TRASH.to_string();
    };
    let (groups, entries) = purge_counts(vault, &trash.id);
    format!(
        "Trash: {} ({})\nEntries in trash: {}\nPurge would remove {groups} group(s) and {entries} entry item(s).\n",
        trash.title,
        trash.id,
        trash_count(vault.entries(), &trash.id),
    )
}

fn purge_counts(vault: &MemoryVault, trash: &GroupId) -> (usize, usize) {
    (
        groups_under(vault.groups(), trash).len(),
        entries_under(vault.groups(), vault.entries(), trash).len(),
    )
}

fn outcome_report(outcome: TrashOutcome, subject: &str) -> Report {
    match outcome {
        TrashOutcome::Moved { trash } => Report::changed(format!("Moved {subject} to trash {trash}.\n")),
        TrashOutcome::Purged { groups, entries } => Report::changed(format!(
            "Deleted {groups} group(s) and {entries} entry item(s) from the trash.\n"
        )),
        TrashOutcome::AlreadyInTrash => Report::view(format!("{subject} is already in the trash.\n")),
        TrashOutcome::NoTrash => Report::view(NO_TRASH.to_string()),
    }
}

fn lookup_entry<'a>(vault: &'a MemoryVault, id: &str) -> Result<&'a Entry> {
    let id = EntryId::from(id);
    vault
        .entry(&id)
        .ok_or_else(|| anyhow!(VaultError::UnknownEntry(id)))
}

fn lookup_field<'a>(entry: &'a Entry, property: &str, attribute: bool) -> Result<&'a Field> {
    let property_type = if attribute {
        PropertyType::Attribute
    } else {
        PropertyType::Property
    };
    entry.field(property, property_type).ok_or_else(|| {
        anyhow!(VaultError::UnknownField {
            entry: entry.id.clone(),
            property: property.to_string(),
        })
    })
}
