use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Which stage of start-up (or the run itself) failed.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("package inspector unavailable")]
    Inspector,
    #[display("upload run failed")]
    Pipeline,
}
