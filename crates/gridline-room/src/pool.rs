//! The room pool: every live room, plus the "one spare per template" rule.

use std::collections::BTreeMap;

use gridline_protocol::RoomId;

use crate::{Room, TemplateCatalog, TemplateId, config::ROOM_NAMES};

/// What a [`RoomPool::reconcile`] pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub created: Vec<RoomId>,
    pub retired: Vec<RoomId>,
}

impl Reconciliation {
    /// Returns `true` if the pass created or retired anything.
    pub fn changed(&self) -> bool {
        !self.created.is_empty() || !self.retired.is_empty()
    }
}

/// Owns every live room, keyed (and therefore ordered) by id.
///
/// Ids are handed out by a per-pool counter starting at 1 and never reused.
#[derive(Debug)]
pub struct RoomPool {
    catalog: TemplateCatalog,
    rooms: BTreeMap<RoomId, Room>,
    next_id: u64,
    next_name: usize,
}

impl RoomPool {
    /// Creates an empty pool. Call [`reconcile`](Self::reconcile) to stock it.
    pub fn new(catalog: TemplateCatalog) -> Self {
        Self {
            catalog,
            rooms: BTreeMap::new(),
            next_id: 1,
            next_name: 0,
        }
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn get(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    pub fn get_mut(&mut self, room_id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(&room_id)
    }

    /// Live rooms in id order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Creates an empty `Open` room for `template_id`.
    ///
    /// Returns `None` if the id is not in the catalog.
    pub fn create_room(&mut self, template_id: TemplateId) -> Option<RoomId> {
        let template = self.catalog.get(template_id)?.clone();

        let room_id = RoomId(self.next_id);
        self.next_id += 1;
        let name = ROOM_NAMES[self.next_name % ROOM_NAMES.len()].to_string();
        self.next_name += 1;

        tracing::info!(
            %room_id,
            %template_id,
            template = %template.name,
            name = %name,
            "room created"
        );
        self.rooms
            .insert(room_id, Room::new(room_id, name, template_id, template));
        Some(room_id)
    }

    /// Removes a room from the pool, returning it.
    pub fn retire(&mut self, room_id: RoomId) -> Option<Room> {
        let room = self.rooms.remove(&room_id)?;
        tracing::info!(%room_id, state = %room.state(), "room retired");
        Some(room)
    }

    /// Restores the invariant: exactly one spare room per template.
    ///
    /// Templates without a spare get a new room; templates with several
    /// keep the lowest id and retire the others. Running it twice in a row
    /// changes nothing the second time.
    pub fn reconcile(&mut self) -> Reconciliation {
        let mut report = Reconciliation::default();
        let template_ids: Vec<TemplateId> = self.catalog.iter().map(|(id, _)| id).collect();

        for template_id in template_ids {
            let spares: Vec<RoomId> = self
                .rooms
                .values()
                .filter(|room| room.template_id() == template_id && room.is_spare())
                .map(Room::id)
                .collect();

            match spares.split_first() {
                None => {
                    if let Some(room_id) = self.create_room(template_id) {
                        report.created.push(room_id);
                    }
                }
                Some((_keep, extra)) => {
                    for &room_id in extra {
                        if self.retire(room_id).is_some() {
                            report.retired.push(room_id);
                        }
                    }
                }
            }
        }

        if report.changed() {
            tracing::debug!(
                created = report.created.len(),
                retired = report.retired.len(),
                "pool reconciled"
            );
        }
        report
    }

    /// Number of spare rooms per template, in catalog order.
    pub fn spare_counts(&self) -> Vec<usize> {
        self.catalog
            .iter()
            .map(|(id, _)| {
                self.rooms
                    .values()
                    .filter(|room| room.template_id() == id && room.is_spare())
                    .count()
            })
            .collect()
    }
}
