//! Deterministic DDL file layout
//!
//! Every extracted object lands at
//! `<repo>/<database>/<schema>/<object_type>/<object_name>.sql`, with
//! each component passed through the filesystem normalizer. Path
//! derivation is pure; writing happens in one place with an explicit
//! overwrite policy.

use ddlsync_core::normalize_name;
use std::path::{Path, PathBuf};

/// Default extension for materialized DDL files
pub const DDL_EXTENSION: &str = ".sql";

/// File write failures
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    #[error("File already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Compute the repository path for one object's DDL file
pub fn ddl_file_path(
    base_dir: &Path,
    database: &str,
    schema: &str,
    object_type: &str,
    object_name: &str,
    extension: &str,
) -> PathBuf {
    base_dir
        .join(normalize_name(database))
        .join(normalize_name(schema))
        .join(normalize_name(object_type))
        .join(format!("{}{}", normalize_name(object_name), extension))
}

/// Write one object's DDL, creating parent directories as needed.
///
/// Content is the DDL trimmed of surrounding whitespace with exactly
/// one trailing newline. With `overwrite` disabled an existing file is
/// left untouched and the write fails. Callers normally pass
/// [`DDL_EXTENSION`] for `extension`.
pub fn write_ddl_file(
    base_dir: &Path,
    database: &str,
    schema: &str,
    object_type: &str,
    object_name: &str,
    ddl: &str,
    extension: &str,
    overwrite: bool,
) -> Result<PathBuf, MaterializeError> {
    let path = ddl_file_path(base_dir, database, schema, object_type, object_name, extension);

    if !overwrite && path.exists() {
        return Err(MaterializeError::AlreadyExists(path));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| MaterializeError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut contents = ddl.trim().to_string();
    contents.push('\n');
    std::fs::write(&path, contents).map_err(|source| MaterializeError::Io {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn path_components_are_normalized() {
        let path = ddl_file_path(
            Path::new("/base"),
            "DB",
            "SCHEMA",
            "Table",
            "My Table",
            DDL_EXTENSION,
        );
        assert_eq!(path, Path::new("/base/db/schema/table/my_table.sql"));

        let path = ddl_file_path(Path::new("/base"), "DB", "SCHEMA", "View", "Obj", ".ddl");
        assert_eq!(path, Path::new("/base/db/schema/view/obj.ddl"));
    }

    #[test]
    fn distinct_names_do_not_collide_unless_normalized_equal() {
        let base = Path::new("/base");
        let a = ddl_file_path(base, "DB", "S", "Table", "Obj A", DDL_EXTENSION);
        let b = ddl_file_path(base, "DB", "S", "Table", "Obj-A", DDL_EXTENSION);
        // "Obj A" and "Obj-A" both normalize to "obj_a"
        assert_eq!(a, b);

        let c = ddl_file_path(base, "DB", "S", "Table", "ObjA", DDL_EXTENSION);
        assert_ne!(a, c);
    }

    #[test]
    fn write_trims_and_appends_single_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_ddl_file(
            dir.path(),
            "DB",
            "S",
            "Table",
            "T",
            "\n  CREATE TABLE T ();  \n\n",
            DDL_EXTENSION,
            true,
        )
        .unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents, "CREATE TABLE T ();\n");
    }

    #[test]
    fn overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        write_ddl_file(dir.path(), "DB", "S", "Table", "T", "DDL1", DDL_EXTENSION, true).unwrap();
        let path =
            write_ddl_file(dir.path(), "DB", "S", "Table", "T", "DDL2", DDL_EXTENSION, true)
                .unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "DDL2\n");
    }

    #[test]
    fn no_overwrite_leaves_first_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path =
            write_ddl_file(dir.path(), "DB", "S", "Table", "T", "DDL1", DDL_EXTENSION, true)
                .unwrap();

        let err =
            write_ddl_file(dir.path(), "DB", "S", "Table", "T", "DDL2", DDL_EXTENSION, false)
                .unwrap_err();
        assert!(matches!(err, MaterializeError::AlreadyExists(_)));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "DDL1\n");
    }

    #[test]
    fn custom_extension_is_threaded_through_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path =
            write_ddl_file(dir.path(), "DB", "S", "Table", "T", "DDL", ".ddl", true).unwrap();

        assert!(path.display().to_string().ends_with("t.ddl"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "DDL\n");
    }

    #[test]
    fn special_characters_in_every_component() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_ddl_file(
            dir.path(),
            "D B$",
            "S@C",
            "Ta-ble",
            "Obj!@#",
            "DDL",
            DDL_EXTENSION,
            true,
        )
        .unwrap();

        let rendered = path.display().to_string();
        assert!(rendered.contains("d_b_"));
        assert!(rendered.contains("s_c"));
        assert!(rendered.contains("ta_ble"));
        assert!(rendered.contains("obj___.sql"));
        assert!(path.exists());
    }
}
