use redis::aio::ConnectionManager;

/// Request class a limit applies to. Trading endpoints get a much tighter budget.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EndpointClass {
    Standard,
    Trading,
}

impl EndpointClass {
    fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::Standard => "standard",
            EndpointClass::Trading => "trading",
        }
    }
}

/// Check and consume one request in the user's sliding window.
///
/// Counters live in Redis keyed by user id and endpoint class; the first request in a
/// window sets the expiry. Returns `true` while the caller is within `limit`.
pub async fn check_rate_limit(
    redis: &ConnectionManager,
    user_id: i64,
    class: EndpointClass,
    limit: u32,
    window_seconds: i64,
) -> Result<bool, redis::RedisError> {
    let key = format!("gauntlet:rate:{}:{user_id}", class.as_str());
    let mut conn = redis.clone();

    let (count, _): (i64, i64) = redis::pipe()
        .atomic()
        .cmd("INCR")
        .arg(&key)
        .cmd("EXPIRE")
        .arg(&key)
        .arg(window_seconds)
        .query_async(&mut conn)
        .await?;

    Ok(count <= i64::from(limit))
}
