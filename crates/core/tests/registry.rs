use std::collections::BTreeSet;
use std::fs;

use jitkeeper_core::options::{OptionValue, FASTMATH_OPTION};
use jitkeeper_core::registry::{
    CacheIndex, Kernel, KernelRegistry, KernelResolver, ModuleImporter, SourceImporter, SourceKernel,
};
use jitkeeper_core::{DecoratedFunctionRef, KeeperError};
use tempfile::tempdir;

const CORE: &str = r#"
from numba import njit
from . import config


@njit(fastmath=True)
def _sliding_dot_product(Q, T):
    return Q


@njit(
    # "f8[:](f8[:], i8, b1[:])",
    fastmath={"nsz", "arcp", "contract", "afn", "reassoc"}
)
def _welford(T, m):
    return T


@njit(fastmath=config.STUMPY_FASTMATH_TRUE, cache=True)
def _configured(T):
    return T


@njit
def _bare(a):
    return a
"#;

fn package() -> tempfile::TempDir {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("core.py"), CORE).unwrap();
    tmp
}

#[test]
fn options_come_from_decorator_keywords() {
    let pkg = package();
    let mut registry = KernelRegistry::new(SourceImporter::new(pkg.path(), "njit"));

    let kernel = registry.resolve(&DecoratedFunctionRef::new("core", "_sliding_dot_product")).unwrap();
    assert_eq!(kernel.target_options().get(FASTMATH_OPTION), Some(&OptionValue::Bool(true)));

    let kernel = registry.resolve(&DecoratedFunctionRef::new("core", "_welford")).unwrap();
    let flags: BTreeSet<String> =
        ["afn", "arcp", "contract", "nsz", "reassoc"].iter().map(|s| s.to_string()).collect();
    assert_eq!(kernel.target_options().get(FASTMATH_OPTION), Some(&OptionValue::Flags(flags)));

    let kernel = registry.resolve(&DecoratedFunctionRef::new("core", "_configured")).unwrap();
    assert_eq!(
        kernel.target_options().get(FASTMATH_OPTION),
        Some(&OptionValue::Expr("config.STUMPY_FASTMATH_TRUE".to_string()))
    );
    assert_eq!(kernel.target_options().get("cache"), Some(&OptionValue::Bool(true)));

    let kernel = registry.resolve(&DecoratedFunctionRef::new("core", "_bare")).unwrap();
    assert!(kernel.target_options().is_empty());
}

#[test]
fn modules_are_imported_once() {
    let pkg = package();
    let mut registry = KernelRegistry::new(SourceImporter::new(pkg.path(), "njit"));
    assert!(!registry.is_loaded("core"));

    let bare = DecoratedFunctionRef::new("core", "_bare");
    registry.resolve(&bare).unwrap().target_options_mut().insert("parallel", OptionValue::Bool(true));
    assert!(registry.is_loaded("core"));

    // A second lookup sees the mutation, so the module was not re-imported.
    let kernel = registry.resolve(&bare).unwrap();
    assert_eq!(kernel.target_options().get("parallel"), Some(&OptionValue::Bool(true)));
}

#[test]
fn missing_module_is_an_import_error() {
    let pkg = package();
    let mut registry = KernelRegistry::new(SourceImporter::new(pkg.path(), "njit"));

    let err = registry.resolve(&DecoratedFunctionRef::new("gone", "f")).err().expect("should fail");
    assert!(matches!(err, KeeperError::Import { ref module, .. } if module == "gone"), "{err}");
}

#[test]
fn unmarked_name_is_unresolved() {
    let pkg = package();
    fs::write(pkg.path().join("plain.py"), "def helper(x):\n    return x\n").unwrap();
    let mut registry = KernelRegistry::new(SourceImporter::new(pkg.path(), "njit"));

    let err =
        registry.resolve(&DecoratedFunctionRef::new("plain", "helper")).err().expect("should fail");
    assert!(
        matches!(err, KeeperError::Unresolved { ref module, ref function } if module == "plain" && function == "helper"),
        "{err}"
    );
}

#[test]
fn custom_importer_plugs_into_the_registry() {
    struct Fixed;

    impl ModuleImporter for Fixed {
        fn import(&self, module: &str) -> jitkeeper_core::KeeperResult<Vec<Box<dyn Kernel>>> {
            let kernel = SourceKernel::new(
                DecoratedFunctionRef::new(module, "k"),
                1,
                Default::default(),
                None,
            );
            Ok(vec![Box::new(kernel)])
        }
    }

    let mut registry = KernelRegistry::new(Fixed);
    let kernel = registry.resolve(&DecoratedFunctionRef::new("anything", "k")).unwrap();
    assert_eq!(kernel.reference().qualified_name(), "anything.k");
}

#[test]
fn recompile_without_caching_writes_nothing() {
    let cache = tempdir().unwrap();
    let mut kernel = SourceKernel::new(
        DecoratedFunctionRef::new("core", "k"),
        10,
        Default::default(),
        Some(cache.path().join("__pycache__")),
    );
    assert!(!kernel.caching_enabled());

    kernel.recompile().unwrap();
    assert_eq!(kernel.generation(), 1);
    assert!(!cache.path().join("__pycache__").exists());
}

#[test]
fn enable_caching_then_recompile_persists_artifacts() {
    let cache = tempdir().unwrap();
    let dir = cache.path().join("__pycache__");
    let mut kernel =
        SourceKernel::new(DecoratedFunctionRef::new("core", "k"), 42, Default::default(), Some(dir.clone()));

    kernel.enable_caching().unwrap();
    let index_path = dir.join("core.k-42.nbi");
    assert!(index_path.is_file());

    kernel.target_options_mut().insert(FASTMATH_OPTION, OptionValue::Bool(false));
    kernel.recompile().unwrap();
    assert!(dir.join("core.k-42.nbc").is_file());

    let index: CacheIndex =
        serde_json::from_str(&fs::read_to_string(&index_path).unwrap()).unwrap();
    assert_eq!(index.function, "core.k");
    assert_eq!(index.generation, 1);
    assert_eq!(index.target_options.get(FASTMATH_OPTION), Some(&OptionValue::Bool(false)));
    assert_eq!(kernel.compiled_options(), Some(&index.target_options));
}

#[test]
fn existing_index_turns_caching_on() {
    let cache = tempdir().unwrap();
    let dir = cache.path().to_path_buf();
    fs::write(dir.join("core.k-3.nbi"), "{}").unwrap();

    let kernel = SourceKernel::new(DecoratedFunctionRef::new("core", "k"), 3, Default::default(), Some(dir));
    assert!(kernel.caching_enabled());
}

#[test]
fn enable_caching_requires_a_cache_dir() {
    let mut kernel =
        SourceKernel::new(DecoratedFunctionRef::new("core", "k"), 1, Default::default(), None);
    let err = kernel.enable_caching().unwrap_err();
    assert!(matches!(err, KeeperError::NoCacheDir(ref name) if name == "core.k"), "{err}");
}

#[test]
fn failed_enable_leaves_caching_off() {
    let tmp = tempdir().unwrap();
    let blocker = tmp.path().join("not-a-dir");
    fs::write(&blocker, "file").unwrap();

    let mut kernel =
        SourceKernel::new(DecoratedFunctionRef::new("core", "k"), 1, Default::default(), Some(blocker));
    assert!(kernel.enable_caching().is_err());
    assert!(!kernel.caching_enabled());
}

#[test]
fn splat_decorator_imports_an_opaque_entry() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("m.py"), "@njit(**opts)\ndef k(x):\n    return x\n").unwrap();
    let mut registry = KernelRegistry::new(SourceImporter::new(tmp.path(), "njit"));

    let kernel = registry.resolve(&DecoratedFunctionRef::new("m", "k")).expect("resolve");
    assert_eq!(kernel.target_options().get("**"), Some(&OptionValue::Expr("**opts".into())));
    assert!(kernel.target_options().may_set(FASTMATH_OPTION));
}
