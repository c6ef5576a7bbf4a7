use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("ltv max fraction {0} is out of range [0.5, 1]")]
    LtvFractionOutOfRange(f64),

    #[error("Data source error: {0}")]
    DataSource(String),
}

pub type Result<T> = std::result::Result<T, Error>;
