use host_api::error::HostApiError;

/// Why a session could not be launched.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// The project directory was empty or whitespace. Rejected locally so the
    /// host never sees a session it would immediately fail.
    #[error("project directory must not be blank")]
    MissingProjectDir,

    #[error(transparent)]
    Host(#[from] HostApiError),
}
