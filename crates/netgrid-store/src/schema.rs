//! Game store database schema.

/// SQL to create the player, cooldown, and trace tables. Mirrors the
/// checked-in migration for deployments that bootstrap without the
/// migration runner.
pub const CREATE_GAME_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS players (
    player_id         UUID PRIMARY KEY,
    handle            VARCHAR(255) NOT NULL,
    level             BIGINT NOT NULL,
    xp                BIGINT NOT NULL,
    balance           BIGINT NOT NULL CHECK (balance >= 0),
    unlocked_commands TEXT[] NOT NULL DEFAULT '{}',
    banned            BOOLEAN NOT NULL DEFAULT FALSE,
    ban_reason        TEXT,
    created_at        TIMESTAMPTZ NOT NULL,
    updated_at        TIMESTAMPTZ NOT NULL,
    version           BIGINT NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS cooldowns (
    player_id        UUID NOT NULL,
    command_id       VARCHAR(255) NOT NULL,
    next_eligible_at TIMESTAMPTZ NOT NULL,
    updated_at       TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (player_id, command_id)
);

CREATE TABLE IF NOT EXISTS invocation_traces (
    player_id   UUID NOT NULL,
    trace_id    VARCHAR(255) NOT NULL,
    command_id  VARCHAR(255) NOT NULL,
    payload     JSONB NOT NULL,
    recorded_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (player_id, trace_id)
);

CREATE INDEX IF NOT EXISTS idx_invocation_traces_recorded_at
    ON invocation_traces (recorded_at);
";
