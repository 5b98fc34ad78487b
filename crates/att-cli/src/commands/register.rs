//! Register command for creating or updating registration records.

use std::io::Write;

use anyhow::{Context, Result};

use att_core::{Registration, UserId};
use att_db::Database;

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    user: &str,
    name: &str,
    department: Option<&str>,
    laptop: Option<&str>,
) -> Result<()> {
    let registration = Registration {
        user_id: UserId::new(user).context("user ID cannot be empty")?,
        name: name.to_string(),
        department: department.map(String::from),
        laptop_brand: laptop.map(String::from),
    };
    db.upsert_registration(&registration)?;

    writeln!(
        writer,
        "Registered {} as {} ({})",
        user,
        name,
        registration
            .department
            .as_deref()
            .unwrap_or(att_core::DEFAULT_DEPARTMENT)
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_creates_and_updates() {
        let mut db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();

        run(&mut out, &mut db, "alice", "Alice", Some("Engineering"), None).unwrap();
        run(&mut out, &mut db, "alice", "Alice A.", Some("Support"), Some("Dell")).unwrap();

        let reg = db.get_registration("alice").unwrap().unwrap();
        assert_eq!(reg.name, "Alice A.");
        assert_eq!(reg.department.as_deref(), Some("Support"));
        assert_eq!(reg.laptop_brand.as_deref(), Some("Dell"));

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Registered alice as Alice (Engineering)"));
        assert!(out.contains("Registered alice as Alice A. (Support)"));
    }

    #[test]
    fn register_without_department_reports_default() {
        let mut db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();

        run(&mut out, &mut db, "bob", "Bob", None, None).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Registered bob as Bob (General)"));
    }
}
