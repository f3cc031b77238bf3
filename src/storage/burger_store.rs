//! Burger and restaurant persistence.
//!
//! Holds the catalog entities the engine scores: restaurants and their
//! burgers, including the derived aggregate and ranking fields.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use uuid::Uuid;

/// Restaurant serving one or more burgers.
#[derive(Debug, Clone)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
}

impl Restaurant {
    /// Create a new restaurant.
    pub fn new(name: String, city: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            city,
            created_at: Utc::now(),
        }
    }
}

/// A burger on the platform.
///
/// `aggregate_rating` and `rating_count` are derived from the live rating
/// set; `elo_score` is None until the burger enters its first match and
/// readers substitute the configured initial score. `ranking_score` is a
/// cached composite, never authoritative.
#[derive(Debug, Clone)]
pub struct Burger {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub burger_type: Option<String>,
    pub image_url: Option<String>,
    pub city: String,
    pub aggregate_rating: f64,
    pub rating_count: i64,
    pub elo_score: Option<f64>,
    pub ranking_score: Option<f64>,
    pub featured_order: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Burger {
    /// Create a new burger with empty aggregates.
    pub fn new(restaurant_id: Uuid, name: String, city: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            restaurant_id,
            name,
            burger_type: None,
            image_url: None,
            city,
            aggregate_rating: 0.0,
            rating_count: 0,
            elo_score: None,
            ranking_score: None,
            featured_order: None,
            created_at: Utc::now(),
        }
    }
}

/// Store for burger and restaurant rows.
pub struct BurgerStore<'a> {
    conn: &'a Connection,
}

impl<'a> BurgerStore<'a> {
    /// Create a new store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a restaurant.
    pub fn insert_restaurant(&self, restaurant: &Restaurant) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO restaurants (id, name, city, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                restaurant.id.to_string(),
                restaurant.name,
                restaurant.city,
                restaurant.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a restaurant by id.
    pub fn get_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, StoreError> {
        self.conn
            .query_row(
                "SELECT id, name, city, created_at FROM restaurants WHERE id = ?1",
                params![id.to_string()],
                parse_restaurant_row,
            )
            .optional()
            .map_err(StoreError::from)
    }

    /// Insert a burger.
    pub fn insert_burger(&self, burger: &Burger) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO burgers
             (id, restaurant_id, name, burger_type, image_url, city,
              aggregate_rating, rating_count, elo_score, ranking_score,
              featured_order, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                burger.id.to_string(),
                burger.restaurant_id.to_string(),
                burger.name,
                burger.burger_type,
                burger.image_url,
                burger.city,
                burger.aggregate_rating,
                burger.rating_count,
                burger.elo_score,
                burger.ranking_score,
                burger.featured_order,
                burger.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a burger by id.
    pub fn get_burger(&self, id: Uuid) -> Result<Option<Burger>, StoreError> {
        self.conn
            .query_row(
                "SELECT id, restaurant_id, name, burger_type, image_url, city,
                        aggregate_rating, rating_count, elo_score, ranking_score,
                        featured_order, created_at
                 FROM burgers WHERE id = ?1",
                params![id.to_string()],
                parse_burger_row,
            )
            .optional()
            .map_err(StoreError::from)
    }

    /// Whether a burger exists.
    pub fn burger_exists(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut stmt = self.conn.prepare("SELECT 1 FROM burgers WHERE id = ?1")?;
        stmt.exists(params![id.to_string()]).map_err(StoreError::from)
    }

    /// List all burgers.
    pub fn list_burgers(&self) -> Result<Vec<Burger>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, restaurant_id, name, burger_type, image_url, city,
                    aggregate_rating, rating_count, elo_score, ranking_score,
                    featured_order, created_at
             FROM burgers ORDER BY name ASC",
        )?;

        let rows = stmt.query_map([], parse_burger_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Recompute a burger's aggregate rating and rating count from the full
    /// live rating set. One statement, scoped per burger, so two concurrent
    /// submissions cannot overwrite each other with stale sums.
    pub fn recompute_aggregates(&self, burger_id: Uuid) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE burgers SET
                 aggregate_rating = COALESCE(
                     (SELECT AVG(overall_rating) FROM ratings
                      WHERE burger_id = ?1 AND deleted = 0), 0),
                 rating_count =
                     (SELECT COUNT(*) FROM ratings
                      WHERE burger_id = ?1 AND deleted = 0)
             WHERE id = ?1",
            params![burger_id.to_string()],
        )?;

        if updated == 0 {
            return Err(StoreError::BurgerNotFound(burger_id));
        }
        Ok(())
    }

    /// Persist a computed composite ranking score.
    pub fn set_ranking_score(&self, burger_id: Uuid, score: f64) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE burgers SET ranking_score = ?2 WHERE id = ?1",
            params![burger_id.to_string(), score],
        )?;

        if updated == 0 {
            return Err(StoreError::BurgerNotFound(burger_id));
        }
        Ok(())
    }
}

/// Parse a database row into a Restaurant.
fn parse_restaurant_row(row: &rusqlite::Row) -> rusqlite::Result<Restaurant> {
    let id_str: String = row.get(0)?;
    let created_at_str: String = row.get(3)?;

    Ok(Restaurant {
        id: Uuid::parse_str(&id_str).unwrap_or_default(),
        name: row.get(1)?,
        city: row.get(2)?,
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

/// Parse a database row into a Burger.
pub(crate) fn parse_burger_row(row: &rusqlite::Row) -> rusqlite::Result<Burger> {
    let id_str: String = row.get(0)?;
    let restaurant_id_str: String = row.get(1)?;
    let created_at_str: String = row.get(11)?;

    Ok(Burger {
        id: Uuid::parse_str(&id_str).unwrap_or_default(),
        restaurant_id: Uuid::parse_str(&restaurant_id_str).unwrap_or_default(),
        name: row.get(2)?,
        burger_type: row.get(3)?,
        image_url: row.get(4)?,
        city: row.get(5)?,
        aggregate_rating: row.get(6)?,
        rating_count: row.get(7)?,
        elo_score: row.get(8)?,
        ranking_score: row.get(9)?,
        featured_order: row.get(10)?,
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

/// Burger store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Burger not found: {0}")]
    BurgerNotFound(Uuid),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}
