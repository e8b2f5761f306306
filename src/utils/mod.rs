pub mod time;

const ID_LEN: usize = 21;

/// Generate a url-safe unique id for runs and log entries.
pub fn longid() -> String {
    nanoid::nanoid!(ID_LEN)
}
