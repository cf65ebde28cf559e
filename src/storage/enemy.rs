//! Enemy row access.
//!
//! Vitality moves by atomic increments, and the defeated flag flips
//! through a guarded update so the race between two killing blows has
//! exactly one winner.

use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use super::campaign::parse_uuid;
use super::{Result, StorageError};
use crate::model::{Enemy, EnemyKind};

const COLUMNS: &str = "id, name, description, vitality, max_vitality, loot_tier, ordering,
                       defeated, loot_winner, kind, debtor";

type RawRow = (
    String,
    String,
    String,
    i64,
    i64,
    u8,
    i64,
    bool,
    Option<String>,
    String,
    Option<String>,
);

pub fn insert(conn: &Connection, enemy: &Enemy) -> Result<()> {
    conn.execute(
        "INSERT INTO enemy (id, name, description, vitality, max_vitality, loot_tier, ordering,
                            defeated, loot_winner, kind, debtor)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            enemy.id.to_string(),
            enemy.name,
            enemy.description,
            enemy.vitality,
            enemy.max_vitality,
            enemy.loot_tier,
            enemy.ordering,
            enemy.defeated,
            enemy.loot_winner.map(|id| id.to_string()),
            serialize_kind(enemy.kind),
            enemy.debtor.map(|id| id.to_string()),
        ],
    )?;
    Ok(())
}

/// Loads the whole queue in march order.
pub fn load_all(conn: &Connection) -> Result<Vec<Enemy>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM enemy ORDER BY ordering"))?;
    let rows = stmt.query_map([], read_row)?;

    let mut enemies = Vec::new();
    for row in rows {
        enemies.push(from_raw(row?)?);
    }
    Ok(enemies)
}

pub fn find(conn: &Connection, id: Uuid) -> Result<Option<Enemy>> {
    let raw = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM enemy WHERE id = ?1"),
            params![id.to_string()],
            read_row,
        )
        .optional()?;

    match raw {
        Some(raw) => Ok(Some(from_raw(raw)?)),
        None => Ok(None),
    }
}

pub fn find_by_ordering(conn: &Connection, ordering: i64) -> Result<Option<Enemy>> {
    let raw = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM enemy WHERE ordering = ?1"),
            params![ordering],
            read_row,
        )
        .optional()?;

    match raw {
        Some(raw) => Ok(Some(from_raw(raw)?)),
        None => Ok(None),
    }
}

pub fn apply_damage(conn: &Connection, id: Uuid, damage: i64) -> Result<()> {
    conn.execute(
        "UPDATE enemy SET vitality = vitality - ?2 WHERE id = ?1",
        params![id.to_string(), damage],
    )?;
    Ok(())
}

pub fn restore_vitality(conn: &Connection, id: Uuid, amount: i64) -> Result<()> {
    conn.execute(
        "UPDATE enemy SET vitality = vitality + ?2 WHERE id = ?1",
        params![id.to_string(), amount],
    )?;
    Ok(())
}

pub fn vitality(conn: &Connection, id: Uuid) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT vitality FROM enemy WHERE id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?)
}

/// Flips the defeated flag, but only if it isn't already set. Returns
/// whether this caller won the transition.
pub fn mark_defeated(conn: &Connection, id: Uuid) -> Result<bool> {
    let rows = conn.execute(
        "UPDATE enemy SET defeated = 1 WHERE id = ?1 AND defeated = 0",
        params![id.to_string()],
    )?;
    Ok(rows == 1)
}

/// Brings a defeated enemy back and forgets who claimed its loot.
pub fn revive(conn: &Connection, id: Uuid) -> Result<()> {
    conn.execute(
        "UPDATE enemy SET defeated = 0, loot_winner = NULL WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(())
}

pub fn set_loot_winner(conn: &Connection, id: Uuid, winner: Uuid) -> Result<()> {
    conn.execute(
        "UPDATE enemy SET loot_winner = ?2 WHERE id = ?1",
        params![id.to_string(), winner.to_string()],
    )?;
    Ok(())
}

pub fn set_ordering(conn: &Connection, id: Uuid, ordering: i64) -> Result<()> {
    conn.execute(
        "UPDATE enemy SET ordering = ?2 WHERE id = ?1",
        params![id.to_string(), ordering],
    )?;
    Ok(())
}

/// Shaves surplus off both vitality columns, never below one point.
pub fn cut_vitality(conn: &Connection, id: Uuid, cut: i64) -> Result<()> {
    conn.execute(
        "UPDATE enemy
         SET vitality = MAX(vitality - ?2, 1),
             max_vitality = MAX(max_vitality - ?2, 1)
         WHERE id = ?1",
        params![id.to_string(), cut],
    )?;
    Ok(())
}

pub fn remove(conn: &Connection, id: Uuid) -> Result<()> {
    conn.execute("DELETE FROM enemy WHERE id = ?1", params![id.to_string()])?;
    Ok(())
}

/// Renames the enemy at an ordering key. Returns whether a row matched.
pub fn update_flavor(
    conn: &Connection,
    ordering: i64,
    name: &str,
    description: &str,
) -> Result<bool> {
    let rows = conn.execute(
        "UPDATE enemy SET name = ?2, description = ?3 WHERE ordering = ?1",
        params![ordering, name, description],
    )?;
    Ok(rows > 0)
}

fn read_row(row: &Row) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
    ))
}

fn from_raw(raw: RawRow) -> Result<Enemy> {
    let (
        id,
        name,
        description,
        vitality,
        max_vitality,
        loot_tier,
        ordering,
        defeated,
        loot_winner,
        kind,
        debtor,
    ) = raw;

    Ok(Enemy {
        id: parse_uuid(&id)?,
        name,
        description,
        vitality,
        max_vitality,
        loot_tier,
        ordering,
        defeated,
        loot_winner: loot_winner.as_deref().map(parse_uuid).transpose()?,
        kind: deserialize_kind(&kind)?,
        debtor: debtor.as_deref().map(parse_uuid).transpose()?,
    })
}

fn serialize_kind(kind: EnemyKind) -> &'static str {
    match kind {
        EnemyKind::Regular => "regular",
        EnemyKind::Boss => "boss",
        EnemyKind::Shadow => "shadow",
    }
}

fn deserialize_kind(text: &str) -> Result<EnemyKind> {
    match text {
        "regular" => Ok(EnemyKind::Regular),
        "boss" => Ok(EnemyKind::Boss),
        "shadow" => Ok(EnemyKind::Shadow),
        other => Err(StorageError::Corrupt(format!("unknown enemy kind: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::storage::Storage;

    fn test_conn() -> (TempDir, Connection) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        let conn = storage.create_db(Uuid::new_v4()).unwrap();
        (dir, conn)
    }

    fn sample_enemy(ordering: i64) -> Enemy {
        Enemy {
            id: Uuid::new_v4(),
            name: "Rust Mite".into(),
            description: "It gnaws at unoiled armor.".into(),
            vitality: 30,
            max_vitality: 30,
            loot_tier: 1,
            ordering,
            defeated: false,
            loot_winner: None,
            kind: EnemyKind::Regular,
            debtor: None,
        }
    }

    #[test]
    fn insert_find_round_trip() {
        let (_dir, conn) = test_conn();
        let foe = sample_enemy(0);
        insert(&conn, &foe).unwrap();

        let loaded = find(&conn, foe.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Rust Mite");
        assert_eq!(loaded.vitality, 30);
        assert_eq!(loaded.kind, EnemyKind::Regular);
        assert!(loaded.loot_winner.is_none());
        assert!(loaded.debtor.is_none());
    }

    #[test]
    fn load_all_follows_march_order() {
        let (_dir, conn) = test_conn();
        insert(&conn, &sample_enemy(500)).unwrap();
        insert(&conn, &sample_enemy(0)).unwrap();
        insert(&conn, &sample_enemy(2)).unwrap();

        let orderings: Vec<i64> = load_all(&conn).unwrap().iter().map(|e| e.ordering).collect();
        assert_eq!(orderings, vec![0, 2, 500]);
    }

    #[test]
    fn damage_and_restore_are_inverse() {
        let (_dir, conn) = test_conn();
        let foe = sample_enemy(0);
        insert(&conn, &foe).unwrap();

        apply_damage(&conn, foe.id, 12).unwrap();
        assert_eq!(vitality(&conn, foe.id).unwrap(), 18);

        restore_vitality(&conn, foe.id, 12).unwrap();
        assert_eq!(vitality(&conn, foe.id).unwrap(), 30);
    }

    #[test]
    fn vitality_can_go_negative_under_overkill() {
        let (_dir, conn) = test_conn();
        let foe = sample_enemy(0);
        insert(&conn, &foe).unwrap();

        apply_damage(&conn, foe.id, 45).unwrap();
        assert_eq!(vitality(&conn, foe.id).unwrap(), -15);
    }

    #[test]
    fn mark_defeated_has_exactly_one_winner() {
        let (_dir, conn) = test_conn();
        let foe = sample_enemy(0);
        insert(&conn, &foe).unwrap();

        assert!(mark_defeated(&conn, foe.id).unwrap());
        assert!(!mark_defeated(&conn, foe.id).unwrap());
    }

    #[test]
    fn revive_clears_defeat_and_loot() {
        let (_dir, conn) = test_conn();
        let foe = sample_enemy(0);
        insert(&conn, &foe).unwrap();

        let winner = Uuid::new_v4();
        mark_defeated(&conn, foe.id).unwrap();
        set_loot_winner(&conn, foe.id, winner).unwrap();

        revive(&conn, foe.id).unwrap();
        let loaded = find(&conn, foe.id).unwrap().unwrap();
        assert!(!loaded.defeated);
        assert!(loaded.loot_winner.is_none());
    }

    #[test]
    fn cut_vitality_floors_at_one() {
        let (_dir, conn) = test_conn();
        let foe = sample_enemy(0);
        insert(&conn, &foe).unwrap();

        cut_vitality(&conn, foe.id, 10).unwrap();
        let loaded = find(&conn, foe.id).unwrap().unwrap();
        assert_eq!(loaded.vitality, 20);
        assert_eq!(loaded.max_vitality, 20);

        cut_vitality(&conn, foe.id, 1_000).unwrap();
        let loaded = find(&conn, foe.id).unwrap().unwrap();
        assert_eq!(loaded.vitality, 1);
        assert_eq!(loaded.max_vitality, 1);
    }

    #[test]
    fn update_flavor_targets_by_ordering() {
        let (_dir, conn) = test_conn();
        let foe = sample_enemy(3);
        insert(&conn, &foe).unwrap();

        assert!(update_flavor(&conn, 3, "The Unpaid Invoice", "It compounds daily.").unwrap());
        assert!(!update_flavor(&conn, 99, "Nobody", "Nothing.").unwrap());

        let loaded = find(&conn, foe.id).unwrap().unwrap();
        assert_eq!(loaded.name, "The Unpaid Invoice");
        assert_eq!(loaded.description, "It compounds daily.");
    }

    #[test]
    fn set_ordering_moves_the_row() {
        let (_dir, conn) = test_conn();
        let foe = sample_enemy(500);
        insert(&conn, &foe).unwrap();

        set_ordering(&conn, foe.id, 503).unwrap();
        assert_eq!(find(&conn, foe.id).unwrap().unwrap().ordering, 503);
    }

    #[test]
    fn remove_deletes_the_row() {
        let (_dir, conn) = test_conn();
        let foe = sample_enemy(0);
        insert(&conn, &foe).unwrap();

        remove(&conn, foe.id).unwrap();
        assert!(find(&conn, foe.id).unwrap().is_none());
    }

    #[test]
    fn kind_round_trips_through_text() {
        let (_dir, conn) = test_conn();

        for (i, kind) in [EnemyKind::Regular, EnemyKind::Boss, EnemyKind::Shadow]
            .into_iter()
            .enumerate()
        {
            let mut foe = sample_enemy(i64::try_from(i).unwrap());
            foe.kind = kind;
            insert(&conn, &foe).unwrap();
            assert_eq!(find(&conn, foe.id).unwrap().unwrap().kind, kind);
        }
    }
}
