//! Reading rendered manifests from files, directories or stdin

use chartify_core::Manifest;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{CliError, Result};

fn is_manifest_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Expand the `-f` arguments into a sorted list of manifest files.
/// Directories are walked recursively; files are taken as given.
pub fn collect_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.exists() {
            return Err(CliError::input_with_help(
                format!("{} does not exist", input.display()),
                "pass a manifest file or a directory of rendered manifests",
            ));
        }

        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file() && is_manifest_file(entry.path()))
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }

    Ok(files)
}

fn parse(content: &str, source: &str) -> Result<Vec<Manifest>> {
    Manifest::parse_documents(content).map_err(|e| CliError::Input {
        message: format!("{source}: {e}"),
        help: Some("input must be rendered Kubernetes YAML, e.g. the output of `helm template`".into()),
    })
}

/// Read and decode every object, in file order and then document order.
/// With no inputs, stdin is read instead.
pub fn read_manifests(inputs: &[PathBuf]) -> Result<Vec<Manifest>> {
    if inputs.is_empty() {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        return parse(&content, "<stdin>");
    }

    let mut objects = Vec::new();
    for file in collect_files(inputs)? {
        let content = std::fs::read_to_string(&file).map_err(|e| CliError::io_at(&file, e))?;
        let parsed = parse(&content, &file.display().to_string())?;
        tracing::debug!(file = %file.display(), objects = parsed.len(), "read manifests");
        objects.extend(parsed);
    }

    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SERVICE: &str = "apiVersion: v1\nkind: Service\nmetadata:\n  name: web\n";
    const CONFIGMAP: &str = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\n";

    #[test]
    fn test_collect_files_walks_directories_sorted() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("nested")).unwrap();
        std::fs::write(temp.path().join("b.yaml"), SERVICE).unwrap();
        std::fs::write(temp.path().join("nested/a.yml"), CONFIGMAP).unwrap();
        std::fs::write(temp.path().join("README.md"), "# notes").unwrap();

        let files = collect_files(&[temp.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(temp.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(names, vec![PathBuf::from("b.yaml"), PathBuf::from("nested/a.yml")]);
    }

    #[test]
    fn test_missing_input_is_input_error() {
        let temp = TempDir::new().unwrap();
        let err = collect_files(&[temp.path().join("absent.yaml")]).unwrap_err();
        assert!(matches!(err, CliError::Input { .. }));
    }

    #[test]
    fn test_read_manifests_keeps_order() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("all.yaml");
        std::fs::write(&file, format!("{SERVICE}---\n{CONFIGMAP}")).unwrap();

        let objects = read_manifests(&[file]).unwrap();
        let kinds: Vec<_> = objects.iter().map(|o| o.gvk().kind.as_str()).collect();
        assert_eq!(kinds, vec!["Service", "ConfigMap"]);
    }

    #[test]
    fn test_invalid_yaml_names_the_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("broken.yaml");
        std::fs::write(&file, "kind: [unclosed").unwrap();

        let err = read_manifests(&[file]).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }
}
