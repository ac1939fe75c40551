#![allow(dead_code)]

use std::cell::{Cell as CountCell, RefCell};
use std::collections::VecDeque;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use inventory_bot::error::{InventoryError, InventoryResult};
use inventory_bot::source::{RawTable, SheetLocation, TabularSource};
use inventory_bot::telegram::{ChatTransport, InboundEvent, OutboundMessage};
use tempfile::{tempdir, TempDir};

pub const HEADER: [&str; 5] = ["Username", "Mahsulot Kategoriyasi", "Sklad", "Model", "Soni"];

/// Inventory table with the standard header followed by `rows`.
pub fn inventory(rows: &[[&str; 5]]) -> RawTable {
    let mut all = vec![HEADER.to_vec()];
    all.extend(rows.iter().map(|row| row.to_vec()));
    RawTable::from_text_rows(all)
}

pub fn location() -> SheetLocation {
    SheetLocation {
        spreadsheet_id: "sheet-1".to_string(),
        sheet_name: "DALONG".to_string(),
        range: "A1:Z1000".to_string(),
    }
}

/// Source that serves a fixed table and counts fetches.
pub struct StaticSource {
    table: InventoryResult<RawTable>,
    pub fetches: CountCell<usize>,
}

impl StaticSource {
    pub fn new(table: RawTable) -> Self {
        Self {
            table: Ok(table),
            fetches: CountCell::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            table: Err(InventoryError::Fetch(message.to_string())),
            fetches: CountCell::new(0),
        }
    }
}

impl TabularSource for StaticSource {
    fn fetch(&self, _sheet_id: &str, _range_expr: &str) -> InventoryResult<RawTable> {
        self.fetches.set(self.fetches.get() + 1);
        match &self.table {
            Ok(table) => Ok(table.clone()),
            Err(InventoryError::Fetch(message)) => Err(InventoryError::Fetch(message.clone())),
            Err(err) => Err(InventoryError::Fetch(err.to_string())),
        }
    }
}

/// Source that answers each fetch with the next scripted result, in order.
pub struct ScriptedSource {
    script: RefCell<VecDeque<InventoryResult<RawTable>>>,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = InventoryResult<RawTable>>) -> Self {
        Self {
            script: RefCell::new(script.into_iter().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

impl TabularSource for ScriptedSource {
    fn fetch(&self, _sheet_id: &str, _range_expr: &str) -> InventoryResult<RawTable> {
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(InventoryError::Fetch("script exhausted".to_string())))
    }
}

/// Transport that replays queued events and records every outbound action.
#[derive(Default)]
pub struct RecordingTransport {
    pub queued: Vec<InboundEvent>,
    pub sent: RefCell<Vec<OutboundMessage>>,
    pub acknowledged: RefCell<Vec<(String, String)>>,
}

impl ChatTransport for RecordingTransport {
    fn poll(&mut self) -> InventoryResult<Vec<InboundEvent>> {
        Ok(std::mem::take(&mut self.queued))
    }

    fn send(&self, message: &OutboundMessage) -> InventoryResult<()> {
        self.sent.borrow_mut().push(message.clone());
        Ok(())
    }

    fn acknowledge(&self, event_id: &str, notice: &str) -> InventoryResult<()> {
        self.acknowledged
            .borrow_mut()
            .push((event_id.to_string(), notice.to_string()));
        Ok(())
    }
}

pub fn text_from(sender: &str, text: &str) -> InboundEvent {
    InboundEvent::TextMessage {
        chat_id: 42,
        sender: Some(sender.to_string()),
        text: text.to_string(),
    }
}

pub fn click_from(sender: &str, payload: &str) -> InboundEvent {
    InboundEvent::Callback {
        chat_id: 42,
        sender: Some(sender.to_string()),
        event_id: "cb-1".to_string(),
        payload: payload.to_string(),
    }
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}
