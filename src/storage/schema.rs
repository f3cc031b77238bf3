//! Database schema definitions for BurgerRank.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Restaurants table
CREATE TABLE IF NOT EXISTS restaurants (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    city TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Burgers table
CREATE TABLE IF NOT EXISTS burgers (
    id TEXT PRIMARY KEY,
    restaurant_id TEXT NOT NULL REFERENCES restaurants(id),
    name TEXT NOT NULL,
    burger_type TEXT,
    image_url TEXT,
    city TEXT NOT NULL,
    aggregate_rating REAL NOT NULL DEFAULT 0,
    rating_count INTEGER NOT NULL DEFAULT 0,
    elo_score REAL,
    ranking_score REAL,
    featured_order INTEGER,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_burgers_restaurant_id ON burgers(restaurant_id);
CREATE INDEX IF NOT EXISTS idx_burgers_city ON burgers(city);

-- Ratings table
CREATE TABLE IF NOT EXISTS ratings (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    burger_id TEXT NOT NULL REFERENCES burgers(id),
    overall_rating INTEGER NOT NULL,
    bread INTEGER,
    meat INTEGER,
    toppings INTEGER,
    sauce INTEGER,
    has_ticket INTEGER NOT NULL DEFAULT 0,
    ticket_url TEXT,
    price REAL,
    comment TEXT,
    consumption_type TEXT,
    appetizers_json TEXT,
    points_awarded INTEGER NOT NULL DEFAULT 0,
    deleted INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- One live rating per (user, burger); soft-deleted rows do not count
CREATE UNIQUE INDEX IF NOT EXISTS idx_ratings_user_burger_live
    ON ratings(user_id, burger_id) WHERE deleted = 0;
CREATE INDEX IF NOT EXISTS idx_ratings_burger_id ON ratings(burger_id);
CREATE INDEX IF NOT EXISTS idx_ratings_user_id ON ratings(user_id);

-- Match records table (append-only)
CREATE TABLE IF NOT EXISTS match_records (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    burger_a_id TEXT NOT NULL REFERENCES burgers(id),
    burger_b_id TEXT NOT NULL REFERENCES burgers(id),
    winner_id TEXT NOT NULL,
    score_a_before REAL NOT NULL,
    score_b_before REAL NOT NULL,
    score_a_after REAL NOT NULL,
    score_b_after REAL NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_match_records_user_created ON match_records(user_id, created_at);

-- User point balances
CREATE TABLE IF NOT EXISTS user_points (
    user_id TEXT PRIMARY KEY,
    available_points INTEGER NOT NULL DEFAULT 0 CHECK (available_points >= 0),
    total_points INTEGER NOT NULL DEFAULT 0 CHECK (total_points >= 0)
);

-- Badge catalog
CREATE TABLE IF NOT EXISTS badges (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    emoji TEXT NOT NULL,
    condition_kind TEXT NOT NULL,
    target INTEGER NOT NULL,
    points_reward INTEGER NOT NULL
);

-- Per-user badge progress
CREATE TABLE IF NOT EXISTS user_badges (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    badge_id TEXT NOT NULL REFERENCES badges(id),
    progress INTEGER NOT NULL DEFAULT 0,
    unlocked INTEGER NOT NULL DEFAULT 0,
    unlocked_at TEXT,
    updated_at TEXT NOT NULL,
    UNIQUE(user_id, badge_id)
);

CREATE INDEX IF NOT EXISTS idx_user_badges_user_id ON user_badges(user_id);
"#;

/// SQL for schema version tracking (migrations)
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;
