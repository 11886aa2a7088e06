//! The live attendance view: the roster plus whatever statuses are currently
//! selected. A member without an entry in `selections` is "unset", which is
//! shown as no selection and saved as `Absent`.

use shared::AttendanceStatus;
use std::collections::HashMap;

use super::member::Member;
use crate::domain::errors::{AttendanceError, AttendanceResult};

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceSheet {
    members: Vec<Member>,
    selections: HashMap<String, AttendanceStatus>,
}

/// Borrowed view of one row of the sheet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetRow<'a> {
    pub member: &'a Member,
    pub status: Option<AttendanceStatus>,
}

impl SheetRow<'_> {
    pub fn effective_status(&self) -> AttendanceStatus {
        self.status.unwrap_or_default()
    }
}

impl AttendanceSheet {
    pub fn new(members: Vec<Member>) -> Self {
        Self {
            members,
            selections: HashMap::new(),
        }
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn members_mut(&mut self) -> &mut [Member] {
        &mut self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member(&self, member_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id() == member_id)
    }

    pub fn rows(&self) -> impl Iterator<Item = SheetRow<'_>> {
        self.members.iter().map(move |member| SheetRow {
            member,
            status: self.selections.get(member.id()).copied(),
        })
    }

    /// Explicit selection, `None` when unset
    pub fn status(&self, member_id: &str) -> Option<AttendanceStatus> {
        self.selections.get(member_id).copied()
    }

    /// Selection with unset mapped to `Absent`
    pub fn effective_status(&self, member_id: &str) -> AttendanceStatus {
        self.status(member_id).unwrap_or_default()
    }

    pub fn set_status(&mut self, member_id: &str, status: AttendanceStatus) -> AttendanceResult<()> {
        self.ensure_member(member_id)?;
        self.selections.insert(member_id.to_string(), status);
        Ok(())
    }

    pub fn clear_status(&mut self, member_id: &str) -> AttendanceResult<()> {
        self.ensure_member(member_id)?;
        self.selections.remove(member_id);
        Ok(())
    }

    pub fn clear_all_statuses(&mut self) {
        self.selections.clear();
    }

    pub fn rename(&mut self, member_id: &str, name: &str) -> AttendanceResult<()> {
        let member = self
            .members
            .iter_mut()
            .find(|m| m.id() == member_id)
            .ok_or_else(|| unknown_member(member_id))?;
        member.name = name.to_string();
        Ok(())
    }

    pub fn has_selections(&self) -> bool {
        !self.selections.is_empty()
    }

    pub fn selection_count(&self) -> usize {
        self.selections.len()
    }

    fn ensure_member(&self, member_id: &str) -> AttendanceResult<()> {
        match self.member(member_id) {
            Some(_) => Ok(()),
            None => Err(unknown_member(member_id)),
        }
    }
}

fn unknown_member(member_id: &str) -> AttendanceError {
    AttendanceError::Validation(format!("unknown member '{}'", member_id))
}
