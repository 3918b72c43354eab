//! Redis-backed bucket store.
//!
//! Each strategy's state transition is a Lua script evaluated server side.
//! Redis executes scripts single-threaded per server, which provides the
//! per-key indivisibility the [`BucketStore`] contract requires without any
//! client-side locking. The `redis` crate caches scripts by SHA and falls
//! back to EVAL on a cache miss.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Script;
use tracing::debug;

use crate::error::Result;

use super::BucketStore;

/// Leaky-bucket transition.
///
/// Missing state defaults to an empty bucket whose `last` is now, so no
/// artificial backlog is leaked on first use. Elapsed time is clamped to
/// zero in case a prior writer's clock ran ahead of ours. Rejections leave
/// the stored record untouched: leaked credit is not banked and `last` does
/// not advance.
const LEAKY_BUCKET_SCRIPT: &str = r#"
local key = KEYS[1]
local rate = tonumber(ARGV[1])
local capacity = tonumber(ARGV[2])
local now = tonumber(ARGV[3])

local bucket = redis.call('HMGET', key, 'water', 'last')
local water = tonumber(bucket[1]) or 0
local last = tonumber(bucket[2]) or now

local elapsed = math.max(0, now - last)
local leaked = elapsed / 1000 * rate
water = math.max(0, water - leaked)

if water + 1 > capacity then
    return 0
end

water = water + 1
redis.call('HMSET', key, 'water', water, 'last', now)
redis.call('PEXPIRE', key, 60000)
return 1
"#;

/// Token-bucket transition.
///
/// Missing state defaults to a full bucket. Unlike the leaky bucket, the
/// refilled token count and a `last` of now are written on every call,
/// admitted or denied.
const TOKEN_BUCKET_SCRIPT: &str = r#"
local key = KEYS[1]
local rate = tonumber(ARGV[1])
local capacity = tonumber(ARGV[2])
local now = tonumber(ARGV[3])

local bucket = redis.call('HMGET', key, 'tokens', 'last')
local tokens = tonumber(bucket[1]) or capacity
local last = tonumber(bucket[2]) or now

local elapsed = math.max(0, now - last)
local generated = elapsed / 1000 * rate
tokens = math.min(capacity, tokens + generated)

local allowed = 0
if tokens >= 1 then
    tokens = tokens - 1
    allowed = 1
end

redis.call('HMSET', key, 'tokens', tokens, 'last', now)
redis.call('PEXPIRE', key, 60000)
return allowed
"#;

/// A [`BucketStore`] backed by a shared Redis server.
///
/// The connection manager multiplexes all calls over one connection and
/// reconnects transparently.
pub struct RedisStore {
    conn: ConnectionManager,
    leaky: Script,
    token: Script,
}

impl RedisStore {
    /// Connect to the Redis server at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;

        debug!(url = %url, "Connected to Redis bucket store");

        Ok(Self {
            conn,
            leaky: Script::new(LEAKY_BUCKET_SCRIPT),
            token: Script::new(TOKEN_BUCKET_SCRIPT),
        })
    }

    async fn eval(&self, script: &Script, key: &str, rate: f64, capacity: f64, now_ms: i64) -> Result<i64> {
        let mut conn = self.conn.clone();
        let verdict: i64 = script
            .key(key)
            .arg(rate)
            .arg(capacity)
            .arg(now_ms)
            .invoke_async(&mut conn)
            .await?;
        Ok(verdict)
    }
}

#[async_trait]
impl BucketStore for RedisStore {
    async fn leaky_bucket(&self, key: &str, rate: f64, capacity: f64, now_ms: i64) -> Result<i64> {
        self.eval(&self.leaky, key, rate, capacity, now_ms).await
    }

    async fn token_bucket(&self, key: &str, rate: f64, capacity: f64, now_ms: i64) -> Result<i64> {
        self.eval(&self.token, key, rate, capacity, now_ms).await
    }
}
