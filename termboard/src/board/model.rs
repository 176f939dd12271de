//! In-memory board structure: ordered status columns holding ordered cards.
//!
//! The board is the client-side rendition of the task list. Relocation
//! primitives mirror what a drop handler needs: append to a column's end,
//! insert at a position, and successor lookup for exact-position restore.
//! A card belongs to exactly one column at all times, and its task's
//! `status` field always matches the column it sits in.

use termboard_proto::task::{Task, TaskId, TaskStatus};

/// Position of a card on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardLocation {
    /// Column the card sits in.
    pub column: TaskStatus,
    /// Zero-based position within the column.
    pub index: usize,
}

/// One drop target: a status column and the cards it currently contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Status this column represents.
    pub status: TaskStatus,
    /// Cards in display order, top to bottom.
    pub cards: Vec<Task>,
}

impl Column {
    /// Creates an empty column for the given status.
    #[must_use]
    pub const fn new(status: TaskStatus) -> Self {
        Self {
            status,
            cards: Vec::new(),
        }
    }

    /// Number of cards in this column.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether this column holds no cards.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// The kanban board: one column per status, in fixed display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    columns: Vec<Column>,
}

impl Board {
    /// Creates an empty board with one column per [`TaskStatus`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            columns: TaskStatus::ALL.iter().map(|s| Column::new(*s)).collect(),
        }
    }

    /// Builds a board from a task list, preserving the given order
    /// within each column.
    ///
    /// Each task lands in the column matching its `status` field.
    #[must_use]
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut board = Self::new();
        for task in tasks {
            board.append_card(task.status, task);
        }
        board
    }

    /// All columns in display order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The column for a status.
    ///
    /// Columns are fixed at construction, one per [`TaskStatus::ALL`]
    /// entry, so the lookup always succeeds.
    #[must_use]
    pub fn column(&self, status: TaskStatus) -> &Column {
        &self.columns[Self::slot(status)]
    }

    fn column_mut(&mut self, status: TaskStatus) -> &mut Column {
        &mut self.columns[Self::slot(status)]
    }

    /// Position of `status` in the fixed column order.
    fn slot(status: TaskStatus) -> usize {
        TaskStatus::ALL
            .iter()
            .position(|s| *s == status)
            .unwrap_or(0)
    }

    /// Total number of cards across all columns.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.columns.iter().map(Column::len).sum()
    }

    /// Whether the board holds any cards at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(Column::is_empty)
    }

    /// Whether a card with this id is on the board.
    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.locate(id).is_some()
    }

    /// Finds the column and position of a card.
    #[must_use]
    pub fn locate(&self, id: TaskId) -> Option<CardLocation> {
        for column in &self.columns {
            if let Some(index) = column.cards.iter().position(|t| t.id == id) {
                return Some(CardLocation {
                    column: column.status,
                    index,
                });
            }
        }
        None
    }

    /// The task behind a card, if present.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        let loc = self.locate(id)?;
        self.column(loc.column).cards.get(loc.index)
    }

    /// Position of a card within a specific column, if it is there.
    #[must_use]
    pub fn index_of(&self, status: TaskStatus, id: TaskId) -> Option<usize> {
        self.column(status).cards.iter().position(|t| t.id == id)
    }

    /// The card immediately after this one in its column, if any.
    ///
    /// This is the next-sibling lookup a drag session records for
    /// exact-position rollback.
    #[must_use]
    pub fn successor_of(&self, id: TaskId) -> Option<TaskId> {
        let loc = self.locate(id)?;
        self.column(loc.column).cards.get(loc.index + 1).map(|t| t.id)
    }

    /// Removes a card from wherever it sits and returns its task.
    pub fn remove_card(&mut self, id: TaskId) -> Option<Task> {
        let loc = self.locate(id)?;
        Some(self.column_mut(loc.column).cards.remove(loc.index))
    }

    /// Appends a card at the end of a column.
    ///
    /// The task's `status` field is updated to match the column.
    pub fn append_card(&mut self, status: TaskStatus, mut task: Task) {
        task.status = status;
        self.column_mut(status).cards.push(task);
    }

    /// Inserts a card at a position within a column, clamping the index
    /// to the column's length.
    ///
    /// The task's `status` field is updated to match the column.
    pub fn insert_card(&mut self, status: TaskStatus, index: usize, mut task: Task) {
        task.status = status;
        let column = self.column_mut(status);
        let index = index.min(column.cards.len());
        column.cards.insert(index, task);
    }

    /// Relocates a card to the end of the target column.
    ///
    /// This is the optimistic move a drop applies: remove from the
    /// current column, append to the target. Moving within a column
    /// sends the card to that column's end. Returns `false` and leaves
    /// the board untouched if the card is not on the board.
    pub fn move_to_column_end(&mut self, id: TaskId, target: TaskStatus) -> bool {
        match self.remove_card(id) {
            Some(task) => {
                self.append_card(target, task);
                true
            }
            None => false,
        }
    }

    /// Iterates over every task on the board, column by column.
    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.columns.iter().flat_map(|c| c.cards.iter())
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
