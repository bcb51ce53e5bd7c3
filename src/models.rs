use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stable identifier for an alarm. Positions in the list may change when
/// alarms are reordered or removed; ids never do.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlarmId(pub(crate) u32);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmKind {
    /// Counts down a fixed number of seconds from arm time.
    Countdown { seconds: u32 },
    /// Fires at a time of day, given as minutes after midnight. Arming wraps
    /// to the next day when that time has already passed today.
    DailyTime { minutes: u32 },
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AlarmDefinition {
    pub id: AlarmId,
    pub name: String,
    pub kind: AlarmKind,
    /// Shell command launched on expiry. Empty means no command.
    #[serde(default)]
    pub command: String,
}

impl AlarmDefinition {
    /// Short description shown as the tooltip while this alarm is armed.
    pub fn info_text(&self) -> String {
        match self.kind {
            AlarmKind::Countdown { seconds } => format!(
                "{} ({})",
                self.name,
                humantime::format_duration(Duration::from_secs(seconds as u64))
            ),
            AlarmKind::DailyTime { minutes } => {
                format!("{} (at {:02}:{:02})", self.name, minutes / 60, minutes % 60)
            }
        }
    }
}

/// Ordered alarm list with a selection. The selection is kept by id, so it
/// survives reordering without any index bookkeeping; it always resolves to
/// a valid entry while the list is non-empty, falling back to the first
/// entry when the selected alarm is removed.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct AlarmList {
    alarms: Vec<AlarmDefinition>,
    next_id: u32,
    #[serde(skip)]
    selected: Option<AlarmId>,
}

impl AlarmList {
    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlarmDefinition> {
        self.alarms.iter()
    }

    pub fn get(&self, id: AlarmId) -> Option<&AlarmDefinition> {
        self.alarms.iter().find(|a| a.id == id)
    }

    pub fn position(&self, id: AlarmId) -> Option<usize> {
        self.alarms.iter().position(|a| a.id == id)
    }

    pub fn add(&mut self, name: String, kind: AlarmKind, command: String) -> AlarmId {
        let id = AlarmId(self.next_id);
        self.next_id += 1;
        self.alarms.push(AlarmDefinition {
            id,
            name,
            kind,
            command,
        });
        if self.selected.is_none() {
            self.selected = Some(id);
        }
        id
    }

    /// Replace the definition carrying the same id. Returns false if the id
    /// is unknown.
    pub fn update(&mut self, definition: AlarmDefinition) -> bool {
        match self.alarms.iter_mut().find(|a| a.id == definition.id) {
            Some(slot) => {
                *slot = definition;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: AlarmId) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        self.alarms.remove(pos);
        if self.selected == Some(id) {
            self.selected = self.alarms.first().map(|a| a.id);
        }
        true
    }

    pub fn select(&mut self, id: AlarmId) -> bool {
        if self.get(id).is_some() {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn select_prev(&mut self) {
        if let Some(pos) = self.selected_index() {
            let pos = pos.saturating_sub(1);
            self.selected = Some(self.alarms[pos].id);
        }
    }

    pub fn select_next(&mut self) {
        if let Some(pos) = self.selected_index() {
            let pos = (pos + 1).min(self.alarms.len() - 1);
            self.selected = Some(self.alarms[pos].id);
        }
    }

    pub fn selected(&self) -> Option<&AlarmDefinition> {
        self.selected
            .and_then(|id| self.get(id))
            .or_else(|| self.alarms.first())
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected().and_then(|a| self.position(a.id))
    }

    pub fn move_up(&mut self, id: AlarmId) -> bool {
        match self.position(id) {
            Some(pos) if pos > 0 => {
                self.alarms.swap(pos, pos - 1);
                true
            }
            _ => false,
        }
    }

    pub fn move_down(&mut self, id: AlarmId) -> bool {
        match self.position(id) {
            Some(pos) if pos + 1 < self.alarms.len() => {
                self.alarms.swap(pos, pos + 1);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_list() -> AlarmList {
        let mut list = AlarmList::default();
        list.add(
            "tea".to_string(),
            AlarmKind::Countdown { seconds: 300 },
            String::new(),
        );
        list.add(
            "standup".to_string(),
            AlarmKind::DailyTime { minutes: 600 },
            "notify-send standup".to_string(),
        );
        list.add(
            "break".to_string(),
            AlarmKind::Countdown { seconds: 1500 },
            String::new(),
        );
        list
    }

    #[test]
    fn test_add_assigns_distinct_ids_and_selects_first() {
        let list = sample_list();
        let ids: Vec<AlarmId> = list.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|w| w[0] != w[1]));
        assert_eq!(list.selected().unwrap().name, "tea");
        assert_eq!(list.selected_index(), Some(0));
    }

    #[test]
    fn test_remove_selected_falls_back_to_first() {
        let mut list = sample_list();
        let second = list.iter().nth(1).unwrap().id;
        list.select(second);
        assert!(list.remove(second));
        assert_eq!(list.selected().unwrap().name, "tea");
    }

    #[test]
    fn test_remove_other_keeps_selection() {
        let mut list = sample_list();
        let second = list.iter().nth(1).unwrap().id;
        let third = list.iter().nth(2).unwrap().id;
        list.select(second);
        assert!(list.remove(third));
        assert_eq!(list.selected().unwrap().name, "standup");
    }

    #[test]
    fn test_remove_last_entry_empties_selection() {
        let mut list = AlarmList::default();
        let id = list.add(
            "only".to_string(),
            AlarmKind::Countdown { seconds: 10 },
            String::new(),
        );
        assert!(list.remove(id));
        assert!(list.is_empty());
        assert!(list.selected().is_none());
    }

    #[test]
    fn test_selection_survives_reordering() {
        let mut list = sample_list();
        let second = list.iter().nth(1).unwrap().id;
        list.select(second);
        assert!(list.move_up(second));
        assert_eq!(list.selected_index(), Some(0));
        assert_eq!(list.selected().unwrap().name, "standup");
        assert!(list.move_down(second));
        assert_eq!(list.selected_index(), Some(1));
    }

    #[test]
    fn test_move_at_edges_is_rejected() {
        let mut list = sample_list();
        let first = list.iter().next().unwrap().id;
        let last = list.iter().nth(2).unwrap().id;
        assert!(!list.move_up(first));
        assert!(!list.move_down(last));
    }

    #[test]
    fn test_select_prev_next_clamp() {
        let mut list = sample_list();
        list.select_prev();
        assert_eq!(list.selected_index(), Some(0));
        list.select_next();
        list.select_next();
        list.select_next();
        assert_eq!(list.selected_index(), Some(2));
    }

    #[test]
    fn test_update_replaces_by_id() {
        let mut list = sample_list();
        let mut def = list.iter().next().unwrap().clone();
        def.name = "green tea".to_string();
        def.kind = AlarmKind::Countdown { seconds: 240 };
        assert!(list.update(def));
        assert_eq!(list.iter().next().unwrap().name, "green tea");
        let unknown = AlarmDefinition {
            id: AlarmId(999),
            name: "ghost".to_string(),
            kind: AlarmKind::Countdown { seconds: 1 },
            command: String::new(),
        };
        assert!(!list.update(unknown));
    }

    #[test]
    fn test_info_text() {
        let countdown = AlarmDefinition {
            id: AlarmId(0),
            name: "tea".to_string(),
            kind: AlarmKind::Countdown { seconds: 5400 },
            command: String::new(),
        };
        assert_eq!(countdown.info_text(), "tea (1h 30m)");
        let daily = AlarmDefinition {
            id: AlarmId(1),
            name: "wake".to_string(),
            kind: AlarmKind::DailyTime { minutes: 450 },
            command: String::new(),
        };
        assert_eq!(daily.info_text(), "wake (at 07:30)");
    }
}
