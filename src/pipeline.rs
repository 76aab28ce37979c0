//! Compilation pipeline.
//!
//! Drives the external tool sequence for one document: a first compiler
//! pass, then either the bibliography backend plus two fixed re-passes, or
//! a single extra pass when stray auxiliary files indicate unresolved
//! cross-references. Steps run strictly in sequence within one build;
//! every tool's output is forwarded line by line to the log sink under the
//! artifact's label.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::logger::BuildLog;
use crate::stale::BuildDecision;

/// Run the full compilation sequence for one document.
///
/// The decision must come from [`decide`](crate::stale::decide) for this
/// document; staleness is not re-checked here. Tool exit codes are not
/// inspected — `-halt-on-error` keeps a failing pass from going
/// interactive, and the scripted sequence runs to the end regardless.
/// Only a failure to launch a tool aborts the build.
pub fn run(
    document: &Path,
    decision: &BuildDecision,
    config: &BuildConfig,
    log: &dyn BuildLog,
) -> Result<(), BuildError> {
    let dir = match document.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = document
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| document.display().to_string());
    let stem = document
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.clone());
    let label = format!("{stem}.{}", config.artifact_ext);

    let compiler = decision.compiler.executable(&config.tools);
    let latex =
        || run_tool(compiler, &["-halt-on-error", file_name.as_str()], dir, &label, log);

    latex()?;
    if let Some(bib) = decision.bibliography {
        let control = bib.control_file(&stem);
        run_tool(
            bib.executable(&config.tools),
            &[control.as_str()],
            dir,
            &label,
            log,
        )?;
        latex()?;
        latex()?;
    } else if needs_second_pass(dir, &stem, config, &label, log) {
        latex()?;
    }

    log.line(&label, "done");
    Ok(())
}

/// Launch one external tool in `dir` and stream its output to the sink.
///
/// A spawn failure is fatal to this document's build; a nonzero exit is
/// not.
fn run_tool(
    tool: &str,
    args: &[&str],
    dir: &Path,
    label: &str,
    log: &dyn BuildLog,
) -> Result<(), BuildError> {
    let mut child = Command::new(tool)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BuildError::tool_launch(tool, e))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    thread::scope(|scope| {
        if let Some(stream) = stderr {
            scope.spawn(move || forward_lines(stream, label, log));
        }
        if let Some(stream) = stdout {
            forward_lines(stream, label, log);
        }
    });

    // Reap the process; the exit status itself is not inspected.
    let _ = child.wait();
    Ok(())
}

fn forward_lines(stream: impl Read, label: &str, log: &dyn BuildLog) {
    for line in BufReader::new(stream).lines() {
        match line {
            Ok(text) => log.line(label, &text),
            Err(_) => break,
        }
    }
}

/// Probe the document's directory for first-pass outputs that signal
/// unresolved cross-references (a table of contents, an index file and the
/// like): any entry sharing the document's base name with no extension at
/// all, or with an extension outside the expected set.
fn needs_second_pass(
    dir: &Path,
    stem: &str,
    config: &BuildConfig,
    label: &str,
    log: &dyn BuildLog,
) -> bool {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log.warn(
                label,
                &format!("warning: failed to list {}: {e}", dir.display()),
            );
            return false;
        }
    };

    let expected = config.expected_exts();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        // Split on the first dot so "doc.synctex.gz" counts as one
        // unexpected extension.
        let (base, ext) = match name.split_once('.') {
            Some((base, ext)) => (base, Some(ext)),
            None => (name.as_ref(), None),
        };
        if base != stem {
            continue;
        }
        match ext {
            None => return true,
            Some(ext) if !expected.contains(ext) => return true,
            Some(_) => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolSet;
    use crate::logger::MemoryLog;
    use crate::scan::CompilerBackend;
    use crate::stale::BibBackend;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn decision(bibliography: Option<BibBackend>) -> BuildDecision {
        BuildDecision {
            skip: false,
            bibliography,
            compiler: CompilerBackend::Pdflatex,
        }
    }

    #[test]
    fn test_second_pass_on_stray_extension() {
        let dir = TempDir::new().unwrap();
        for name in ["doc.tex", "doc.aux", "doc.log", "doc.pdf", "doc.toc"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let log = MemoryLog::new();

        assert!(needs_second_pass(
            dir.path(),
            "doc",
            &BuildConfig::default(),
            "doc.pdf",
            &log
        ));
    }

    #[test]
    fn test_second_pass_on_bare_base_name() {
        let dir = TempDir::new().unwrap();
        for name in ["doc.tex", "doc"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let log = MemoryLog::new();

        assert!(needs_second_pass(
            dir.path(),
            "doc",
            &BuildConfig::default(),
            "doc.pdf",
            &log
        ));
    }

    #[test]
    fn test_no_second_pass_on_expected_outputs() {
        let dir = TempDir::new().unwrap();
        for name in ["doc.tex", "doc.aux", "doc.log", "doc.pdf", "other.toc"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let log = MemoryLog::new();

        assert!(!needs_second_pass(
            dir.path(),
            "doc",
            &BuildConfig::default(),
            "doc.pdf",
            &log
        ));
    }

    #[test]
    fn test_spawn_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let doc = dir.path().join("doc.tex");
        fs::write(&doc, "text").unwrap();

        let tools = ToolSet {
            pdflatex: dir.path().join("no-such-tool").display().to_string(),
            ..ToolSet::default()
        };
        let config = BuildConfig::default().with_tools(tools);
        let log = MemoryLog::new();

        let err = run(&doc, &decision(None), &config, &log).unwrap_err();
        assert!(matches!(err, BuildError::ToolLaunch { .. }));
    }

    #[cfg(unix)]
    mod with_stub_tools {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
            let path = dir.join(name);
            fs::write(&path, body).unwrap();
            let mut perms = fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&path, perms).unwrap();
            path
        }

        /// Stub compiler: records its invocation, emits a line on each
        /// stream, and produces the expected outputs (plus `extra`).
        fn stub_latex(bin: &Path, extra: &str) -> PathBuf {
            write_script(
                bin,
                "stub-latex",
                &format!(
                    "#!/bin/sh\n\
                     echo \"latex $2\" >> calls.log\n\
                     echo \"This is a stub compiler\"\n\
                     echo \"stub stderr\" >&2\n\
                     base=\"${{2%.tex}}\"\n\
                     : > \"$base.pdf\"\n\
                     : > \"$base.aux\"\n\
                     : > \"$base.log\"\n\
                     {extra}\n"
                ),
            )
        }

        fn stub_biber(bin: &Path) -> PathBuf {
            write_script(
                bin,
                "stub-biber",
                "#!/bin/sh\necho \"biber $1\" >> calls.log\n",
            )
        }

        fn stub_config(latex: &Path, biber: &Path) -> BuildConfig {
            BuildConfig::default().with_tools(ToolSet {
                pdflatex: latex.display().to_string(),
                lualatex: latex.display().to_string(),
                biber: biber.display().to_string(),
                bibtex: biber.display().to_string(),
            })
        }

        fn calls(dir: &Path) -> Vec<String> {
            fs::read_to_string(dir.join("calls.log"))
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect()
        }

        #[test]
        fn test_single_pass_and_output_forwarding() {
            let dir = TempDir::new().unwrap();
            let bin = dir.path().join("bin");
            fs::create_dir(&bin).unwrap();
            let latex = stub_latex(&bin, "");
            let biber = stub_biber(&bin);

            let docs = dir.path().join("docs");
            fs::create_dir(&docs).unwrap();
            let doc = docs.join("doc.tex");
            fs::write(&doc, "text").unwrap();

            let log = MemoryLog::new();
            run(&doc, &decision(None), &stub_config(&latex, &biber), &log).unwrap();

            assert_eq!(calls(&docs), vec!["latex doc.tex"]);
            assert!(docs.join("doc.pdf").exists());

            let lines = log.lines_for("doc.pdf");
            assert!(lines.iter().any(|l| l == "This is a stub compiler"));
            assert!(lines.iter().any(|l| l == "stub stderr"));
            assert_eq!(lines.last().map(String::as_str), Some("done"));
        }

        #[test]
        fn test_stray_file_triggers_one_extra_pass() {
            let dir = TempDir::new().unwrap();
            let bin = dir.path().join("bin");
            fs::create_dir(&bin).unwrap();
            let latex = stub_latex(&bin, ": > \"$base.toc\"");
            let biber = stub_biber(&bin);

            let docs = dir.path().join("docs");
            fs::create_dir(&docs).unwrap();
            let doc = docs.join("doc.tex");
            fs::write(&doc, "text").unwrap();

            let log = MemoryLog::new();
            run(&doc, &decision(None), &stub_config(&latex, &biber), &log).unwrap();

            assert_eq!(calls(&docs), vec!["latex doc.tex", "latex doc.tex"]);
        }

        #[test]
        fn test_bibliography_sequence() {
            let dir = TempDir::new().unwrap();
            let bin = dir.path().join("bin");
            fs::create_dir(&bin).unwrap();
            let latex = stub_latex(&bin, "");
            let biber = stub_biber(&bin);

            let docs = dir.path().join("docs");
            fs::create_dir(&docs).unwrap();
            let doc = docs.join("doc.tex");
            fs::write(&doc, "\\addbibresource{refs.bib}").unwrap();

            let log = MemoryLog::new();
            run(
                &doc,
                &decision(Some(BibBackend::Biber)),
                &stub_config(&latex, &biber),
                &log,
            )
            .unwrap();

            assert_eq!(
                calls(&docs),
                vec![
                    "latex doc.tex",
                    "biber doc.bcf",
                    "latex doc.tex",
                    "latex doc.tex",
                ]
            );
        }
    }
}
