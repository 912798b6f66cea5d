//! Crate-wide constants.

/// Name used for kiln's own cache and data directories.
pub const APP_NAME: &str = "kiln";

/// Default recipe file name looked up in the working directory.
pub const RECIPE_FILENAME: &str = "recipe.lua";

/// Directory (relative to the recipe) used as the build base when none is given.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Subdirectory of the build directory holding generated toolchain files.
pub const GENERATORS_DIR: &str = "generators";

/// Name of the generated CMake toolchain file.
pub const TOOLCHAIN_FILENAME: &str = "kiln_toolchain.cmake";

/// Stamp written into the build directory after a successful build.
pub const BUILD_STAMP_FILENAME: &str = ".kiln-stamp.json";

/// Session state directory inside the build base.
pub const SESSION_DIR: &str = ".kiln";

/// Session state file inside [`SESSION_DIR`].
pub const SESSION_FILENAME: &str = "session.json";

/// Path appended to the project URL to locate a tagged source archive.
pub const ARCHIVE_PATH: &str = "releases/archive/refs/tags";

/// Number of hex characters kept from a SHA-256 for short identifiers.
pub const SHORT_HASH_LEN: usize = 16;
