#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const CORE: &str = r#"
from numba import njit


@njit(fastmath=True)
def _sliding_dot_product(Q, T):
    return Q


@njit(
    # "f8[:](f8[:], i8, b1[:])",
    fastmath={"nsz", "arcp", "contract", "afn", "reassoc"}
)
def _welford_nanvar(a, w):
    return a
"#;

pub const MISSING: &str = r#"
from numba import njit


@njit
def _get_ranges(size, n_chunks, truncate):
    return size


@njit(parallel=True)
def _get_array_ranges(a, n_chunks, truncate):
    return a


@njit(fastmath=True)
def _count_diagonal_ndist(i, m):
    return i
"#;

/// A project root with a `stumpy/` package of the given modules.
pub fn project(modules: &[(&str, &str)]) -> TempDir {
    let root = tempfile::tempdir().expect("tempdir");
    let pkg = root.path().join("stumpy");
    fs::create_dir_all(&pkg).expect("create package dir");
    fs::write(pkg.join("__init__.py"), "@njit\ndef ignored():\n    pass\n").expect("write init");
    for (name, source) in modules {
        fs::write(pkg.join(format!("{name}.py")), source).expect("write module");
    }
    root
}

/// A site-packages root with a pre-populated cache dir for `stumpy`.
pub fn site_packages() -> (TempDir, PathBuf) {
    let site = tempfile::tempdir().expect("tempdir");
    let cache = site.path().join("stumpy").join("__pycache__");
    fs::create_dir_all(&cache).expect("create cache dir");
    fs::write(cache.join("core._mass-480.py311.nbi"), "index").expect("write nbi");
    fs::write(cache.join("core._mass-480.py311.1.nbc"), "data").expect("write nbc");
    fs::write(cache.join("core.cpython-311.pyc"), "bytecode").expect("write pyc");
    (site, cache)
}

pub fn as_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}
