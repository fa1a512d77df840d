//! Database schema definitions for TrailMap.
//!
//! Table and column names follow the layout the mobile app has always
//! shipped with; the schema version lives in `PRAGMA user_version`.

/// Drops every core table, including the legacy `TrailDone` table.
///
/// Child tables go first so the drops succeed with foreign keys enforced.
pub const DROP_CORE_TABLES: &str = r#"
DROP TABLE IF EXISTS "Review";
DROP TABLE IF EXISTS "TrailCompletion";
DROP TABLE IF EXISTS "TrailDone";
DROP TABLE IF EXISTS "Trail";
DROP TABLE IF EXISTS "User";
"#;

/// SQL for creating the version 1 tables.
pub const SCHEMA_V1: &str = r#"
-- Trails, with points and paths stored as JSON text
CREATE TABLE "Trail" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "name" TEXT NOT NULL,
    "downhill" REAL NOT NULL,
    "difficulty" TEXT NOT NULL,
    "length" REAL NOT NULL,
    "duration" REAL NOT NULL,
    "elevation" REAL NOT NULL,
    "startpoint" TEXT NOT NULL,
    "path" TEXT NOT NULL,
    "endpoint" TEXT NOT NULL,
    "description" TEXT,
    "image" TEXT,
    "city" TEXT,
    "region" TEXT,
    "state" TEXT,
    "province" TEXT
);

-- Users
CREATE TABLE "User" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "name" TEXT NOT NULL,
    "surname" TEXT NOT NULL,
    "email" TEXT NOT NULL UNIQUE,
    "password_hash" TEXT NOT NULL,
    "salt" TEXT NOT NULL
);

-- Reviews (several per user/trail pair are allowed)
CREATE TABLE "Review" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "user_id" INTEGER NOT NULL REFERENCES "User"("id"),
    "trail_id" INTEGER NOT NULL REFERENCES "Trail"("id"),
    "rating" INTEGER NOT NULL CHECK ("rating" BETWEEN 1 AND 5),
    "comment" TEXT NOT NULL,
    "created_at" TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_review_trail_id ON "Review"("trail_id");

-- Completed trail runs (duplicates allowed)
CREATE TABLE "TrailCompletion" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "user_id" INTEGER NOT NULL REFERENCES "User"("id"),
    "trail_id" INTEGER NOT NULL REFERENCES "Trail"("id"),
    "completed_at" TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_trail_completion_user_id ON "TrailCompletion"("user_id");
"#;

/// Demonstration data seeded by the version 1 step.
///
/// Ids are assigned by AUTOINCREMENT on an empty table, so the trails get
/// ids 1..=3 and the user id 1.
pub const SEED_V1: &str = r#"
INSERT INTO "Trail" ("name", "downhill", "difficulty", "length", "duration", "elevation", "startpoint", "path", "endpoint", "description", "image", "city", "region", "state", "province")
VALUES ('Alternate Trail', 5.0, 'Intermediate', 8.0, 8.0, 5.0,
    '[45.464664,9.18854]',
    '[[45.464664,9.18854],[45.464799,9.189003],[45.464933,9.189467],[45.465067,9.189931],[45.465201,9.190395],[45.465335,9.190859],[45.46547,9.191323],[45.465604,9.191787],[45.465738,9.192251],[45.465872,9.192715],[45.466006,9.193179],[45.46614,9.193643],[45.466274,9.194107],[45.466408,9.194571],[45.466542,9.195035],[45.466676,9.195499],[45.46681,9.195963],[45.466944,9.196427],[45.467078,9.196891],[45.467212,9.197355],[45.467346,9.197819],[45.46748,9.198283]]',
    '[45.46748,9.198283]',
    'Alternate Trail Description with different path.',
    'https://www.google.com/images/branding/googlelogo/1x/googlelogo_color_272x92dp.png',
    'Milano', 'Lombardia', 'Italia', 'MI');

INSERT INTO "Trail" ("name", "downhill", "difficulty", "length", "duration", "elevation", "startpoint", "path", "endpoint", "description", "image", "city", "region", "state", "province")
VALUES ('Politecnico Trail', 3.0, 'Beginner', 5.0, 4.0, 3.0,
    '[45.062208,7.666218]',
    '[[45.062208,7.666218],[45.0624,7.6666],[45.062532,7.66685],[45.06264,7.66708],[45.06282,7.6674],[45.06301,7.66765],[45.06315,7.66785],[45.06325,7.668],[45.06338,7.66825],[45.06355,7.66855],[45.06368,7.6688],[45.06385,7.66905],[45.064,7.6693],[45.06412,7.66955],[45.06427,7.6698]]',
    '[45.06427,7.6698]',
    'An easy trail starting from the Politecnico di Torino, passing through the nearby streets.',
    'https://upload.wikimedia.org/wikipedia/commons/thumb/1/1a/Politecnico_di_Torino_logo.svg/800px-Politecnico_di_Torino_logo.svg.png',
    'Torino', 'Piemonte', 'Italia', 'TO');

INSERT INTO "Trail" ("name", "downhill", "difficulty", "length", "duration", "elevation", "startpoint", "path", "endpoint", "description", "image", "city", "region", "state", "province")
VALUES ('Advanced Politecnico Trail', 7.0, 'Advanced', 10.0, 6.0, 10.0,
    '[45.062208,7.666218]',
    '[[45.062208,7.666218],[45.06238,7.66655],[45.06252,7.6669],[45.06269,7.6672],[45.06286,7.6675],[45.06304,7.66775],[45.06315,7.66798],[45.0633,7.6682],[45.06348,7.66847],[45.0636,7.66875],[45.06378,7.66902],[45.06395,7.66931],[45.06412,7.66958],[45.06428,7.66986],[45.06444,7.67015],[45.0646,7.67042],[45.06475,7.6707],[45.06488,7.67095],[45.06504,7.67123]]',
    '[45.06504,7.67123]',
    'A more challenging trail that starts from the Politecnico di Torino and passes through different terrains.',
    'https://upload.wikimedia.org/wikipedia/commons/thumb/d/d1/Politecnico_Torino_Torre_U_1.jpg/800px-Politecnico_Torino_Torre_U_1.jpg',
    'Torino', 'Piemonte', 'Italia', 'TO');

INSERT INTO "User" ("name", "surname", "email", "password_hash", "salt")
VALUES ('marco', 'sportelli', 'marco.sportelli@studenti.polito.it',
    'cdc950af487ffa1b726e54556c37990cc10fdb1c5c0b4e93c7b633ab7527039a',
    '8364d528f16ac001c5724a7f245da880');

INSERT INTO "Review" ("user_id", "trail_id", "rating", "comment", "created_at")
VALUES (1, 1, 5, 'This trail is amazing! I loved it!', strftime('%Y-%m-%dT%H:%M:%SZ', 'now'));
INSERT INTO "Review" ("user_id", "trail_id", "rating", "comment", "created_at")
VALUES (1, 2, 4, 'Great!', strftime('%Y-%m-%dT%H:%M:%SZ', 'now'));
INSERT INTO "Review" ("user_id", "trail_id", "rating", "comment", "created_at")
VALUES (1, 3, 1, 'Too steep for a first outing, bring proper shoes.', strftime('%Y-%m-%dT%H:%M:%SZ', 'now'));

INSERT INTO "TrailCompletion" ("user_id", "trail_id", "completed_at")
VALUES (1, 1, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'));
INSERT INTO "TrailCompletion" ("user_id", "trail_id", "completed_at")
VALUES (1, 2, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'));
"#;

/// Number of trails seeded by the version 1 step.
pub const SEEDED_TRAIL_COUNT: usize = 3;

/// Id of the seeded demonstration user.
pub const SEEDED_USER_ID: i64 = 1;
