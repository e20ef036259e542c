use std::path::Path;

use gradewatch_core::{ExamEntry, LectureResult};
use portal_logging::{watch_error, watch_info};
use rusqlite::{params, Connection, OptionalExtension};

use crate::{ExamChange, StoreError};

/// The four-table hierarchy store.
///
/// One department per watched account (keyed by label), lectures under
/// departments, at most one current exam row per (lecture, exam name), and
/// the subscription registry. All writes of one upsert commit together.
pub struct GradeStore {
    conn: Connection,
}

impl GradeStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Reconciles one account's scrape against the stored hierarchy.
    ///
    /// Department and lectures are get-or-create by name. An exam row whose
    /// (name, percentage, date) all match is left alone; anything else
    /// deletes the old row for that exam name and inserts the new values.
    /// Returns one `ExamChange` per inserted or replaced row.
    pub fn upsert(
        &mut self,
        department: &str,
        lectures: &[LectureResult],
    ) -> Result<Vec<ExamChange>, StoreError> {
        let tx = self.conn.transaction()?;
        let mut changes = Vec::new();

        let department_id = get_or_create_department(&tx, department)?;
        for lecture in lectures {
            let lecture_id = get_or_create_lecture(&tx, department_id, &lecture.name)?;
            for exam in &lecture.exams {
                let unchanged: Option<i64> = tx
                    .query_row(
                        "SELECT id FROM Exams
                         WHERE lecture_id = ?1 AND name = ?2 AND percentage = ?3 AND date = ?4",
                        params![lecture_id, exam.name, exam.percentage, exam.date],
                        |row| row.get(0),
                    )
                    .optional()?;
                if unchanged.is_some() {
                    continue;
                }

                // No exact match means new or updated values were entered.
                tx.execute(
                    "DELETE FROM Exams WHERE lecture_id = ?1 AND name = ?2",
                    params![lecture_id, exam.name],
                )?;
                tx.execute(
                    "INSERT INTO Exams (lecture_id, name, percentage, date)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![lecture_id, exam.name, exam.percentage, exam.date],
                )?;
                watch_info!(
                    "New exam values for \"{} / {}\". Overwriting old ones.",
                    lecture.name,
                    exam.name
                );
                changes.push(ExamChange {
                    department: department.to_string(),
                    lecture_id,
                    lecture: lecture.name.clone(),
                    exam: exam.name.clone(),
                });
            }
        }

        tx.commit()?;
        Ok(changes)
    }

    /// Subscribes a user to a lecture. Idempotent; store faults are logged
    /// and surfaced as `false`, never raised.
    pub fn add_subscription(&self, lecture_id: i64, user_id: &str) -> bool {
        match self.try_add_subscription(lecture_id, user_id) {
            Ok(()) => true,
            Err(err) => {
                watch_error!(
                    "Failed to add subscription for lecture {}: {}",
                    lecture_id,
                    err
                );
                false
            }
        }
    }

    fn try_add_subscription(&self, lecture_id: i64, user_id: &str) -> Result<(), StoreError> {
        if self.is_subscribed(lecture_id, user_id)? {
            return Ok(());
        }
        self.conn.execute(
            "INSERT INTO Notifications (lecture_id, user_id) VALUES (?1, ?2)",
            params![lecture_id, user_id],
        )?;
        Ok(())
    }

    /// Unsubscribes a user from a lecture. A no-op on absent pairs; same
    /// fault contract as `add_subscription`.
    pub fn remove_subscription(&self, lecture_id: i64, user_id: &str) -> bool {
        let deleted = self.conn.execute(
            "DELETE FROM Notifications WHERE lecture_id = ?1 AND user_id = ?2",
            params![lecture_id, user_id],
        );
        match deleted {
            Ok(_) => true,
            Err(err) => {
                watch_error!(
                    "Failed to remove subscription for lecture {}: {}",
                    lecture_id,
                    err
                );
                false
            }
        }
    }

    pub fn is_subscribed(&self, lecture_id: i64, user_id: &str) -> Result<bool, StoreError> {
        let row: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM Notifications WHERE lecture_id = ?1 AND user_id = ?2",
                params![lecture_id, user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(row.is_some())
    }

    /// User ids subscribed to a lecture.
    pub fn subscribers(&self, lecture_id: i64) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id FROM Notifications WHERE lecture_id = ?1")?;
        let rows = stmt.query_map(params![lecture_id], |row| row.get(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Lecture ids a user is subscribed to.
    pub fn subscriptions(&self, user_id: &str) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT lecture_id FROM Notifications WHERE user_id = ?1")?;
        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn departments(&self) -> Result<Vec<(i64, String)>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM Departments")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn department_name(&self, id: i64) -> Result<Option<String>, StoreError> {
        let name = self
            .conn
            .query_row(
                "SELECT name FROM Departments WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    pub fn lectures(&self, department_id: i64) -> Result<Vec<(i64, String)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM Lectures WHERE department_id = ?1")?;
        let rows = stmt.query_map(params![department_id], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Current exam rows of a lecture, with their row ids.
    pub fn exams(&self, lecture_id: i64) -> Result<Vec<(i64, ExamEntry)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, percentage, date FROM Exams WHERE lecture_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![lecture_id], |row| {
            Ok((
                row.get(0)?,
                ExamEntry {
                    name: row.get(1)?,
                    percentage: row.get(2)?,
                    date: row.get(3)?,
                },
            ))
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn lecture_name(&self, id: i64) -> Result<Option<String>, StoreError> {
        let name = self
            .conn
            .query_row(
                "SELECT name FROM Lectures WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }
}

fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys=ON;
        CREATE TABLE IF NOT EXISTS Departments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS Lectures (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            department_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            FOREIGN KEY (department_id) REFERENCES Departments(id)
        );
        CREATE TABLE IF NOT EXISTS Exams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lecture_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            percentage TEXT NOT NULL,
            date TEXT NOT NULL,
            FOREIGN KEY (lecture_id) REFERENCES Lectures(id)
        );
        CREATE TABLE IF NOT EXISTS Notifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lecture_id INTEGER NOT NULL,
            user_id TEXT NOT NULL,
            FOREIGN KEY (lecture_id) REFERENCES Lectures(id)
        );
        ",
    )
}

fn get_or_create_department(conn: &Connection, name: &str) -> Result<i64, StoreError> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM Departments WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    watch_info!("No department named \"{}\" yet. Creating one.", name);
    conn.execute("INSERT INTO Departments (name) VALUES (?1)", params![name])?;
    Ok(conn.last_insert_rowid())
}

fn get_or_create_lecture(
    conn: &Connection,
    department_id: i64,
    name: &str,
) -> Result<i64, StoreError> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM Lectures WHERE name = ?1 AND department_id = ?2",
            params![name, department_id],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    watch_info!("No lecture named \"{}\" yet. Creating one.", name);
    conn.execute(
        "INSERT INTO Lectures (department_id, name) VALUES (?1, ?2)",
        params![department_id, name],
    )?;
    Ok(conn.last_insert_rowid())
}
