//! Modal slots handed to externally rendered dialogs.
//!
//! The dialogs themselves (drug detail, indent cart form) live outside this
//! crate. What they receive is `{ drug, visible }` plus two callbacks, which
//! here are the owning controller's `*_closed` / `*_succeeded` methods.

use pharmloc_inventory::InventoryRecord;

/// Props for an external record dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalProps<'a> {
    pub drug: Option<&'a InventoryRecord>,
    pub visible: bool,
}

/// A dialog scoped to a single record.
///
/// Closing hides the dialog but keeps the last record, so a closing
/// animation still has something to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordModal {
    drug: Option<InventoryRecord>,
    visible: bool,
}

impl RecordModal {
    pub fn open(&mut self, record: InventoryRecord) {
        self.drug = Some(record);
        self.visible = true;
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn drug(&self) -> Option<&InventoryRecord> {
        self.drug.as_ref()
    }

    pub fn props(&self) -> ModalProps<'_> {
        ModalProps {
            drug: self.drug.as_ref(),
            visible: self.visible,
        }
    }
}

/// Entry point of the indent (restock request) flow for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndentTrigger {
    modal: RecordModal,
}

impl IndentTrigger {
    pub fn open(&mut self, record: InventoryRecord) {
        self.modal.open(record);
    }

    /// Cancel or dismiss. Always closes, whatever the form was doing.
    pub fn close(&mut self) {
        self.modal.close();
    }

    /// The external form submitted. Closes and returns the record it was for.
    pub fn succeed(&mut self) -> Option<InventoryRecord> {
        if !self.modal.is_visible() {
            return None;
        }
        self.modal.close();
        self.modal.drug().cloned()
    }

    pub fn is_visible(&self) -> bool {
        self.modal.is_visible()
    }

    pub fn props(&self) -> ModalProps<'_> {
        self.modal.props()
    }
}
