use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("frame {frame} arrived after frame {last}: frames must be fed in order")]
    NonMonotonicFrame { frame: u64, last: u64 },
}
