//! Thin layer over swc: parse a module, resolve its scopes, print a module.

use std::{io, path::Path};

use swc_core::{
    common::{
        FileName, GLOBALS, Mark, SourceMap, Spanned, SyntaxContext,
        comments::SingleThreadedComments, sync::Lrc,
    },
    ecma::{
        ast::{EsVersion, Module},
        codegen::{Config as CodegenConfig, Emitter, text_writer::JsWriter},
        parser::{Parser, StringInput, Syntax, lexer::Lexer},
        transforms::base::resolver,
        visit::VisitMutWith,
    },
};

use crate::{
    error::{BundleError, BundleResult},
    session::BundleSession,
};

/// A parsed module whose identifiers carry scope information
#[derive(Debug)]
pub struct ParsedModule {
    pub ast: Module,
    pub top_level_ctxt: SyntaxContext,
    pub unresolved_ctxt: SyntaxContext,
}

/// Parse `source` as an ES module and run scope resolution over it.
///
/// After this returns every module-scope declaration, and every reference to
/// it, carries `top_level_ctxt`; free references carry `unresolved_ctxt`.
pub fn parse_module(
    session: &BundleSession,
    path: &Path,
    source: String,
) -> BundleResult<ParsedModule> {
    let ast = parse_es_module(&session.source_map, &session.comments, path, source)?;

    Ok(GLOBALS.set(&session.globals, || {
        let unresolved_mark = Mark::new();
        let top_level_mark = Mark::new();
        let mut ast = ast;
        ast.visit_mut_with(&mut resolver(unresolved_mark, top_level_mark, false));
        ParsedModule {
            ast,
            top_level_ctxt: SyntaxContext::empty().apply_mark(top_level_mark),
            unresolved_ctxt: SyntaxContext::empty().apply_mark(unresolved_mark),
        }
    }))
}

/// Parse without scope resolution; used for generated runtime snippets too
pub fn parse_es_module(
    source_map: &Lrc<SourceMap>,
    comments: &SingleThreadedComments,
    path: &Path,
    source: String,
) -> BundleResult<Module> {
    let fm = source_map.new_source_file(FileName::Real(path.to_path_buf()).into(), source);
    let lexer = Lexer::new(
        Syntax::Es(Default::default()),
        EsVersion::latest(),
        StringInput::from(&*fm),
        Some(comments),
    );
    let mut parser = Parser::new_from(lexer);
    let result = parser.parse_module();

    let errors = parser.take_errors();
    let error = match result {
        Ok(module) => match errors.into_iter().next() {
            None => return Ok(module),
            Some(error) => error,
        },
        Err(error) => error,
    };

    let loc = source_map.lookup_char_pos(error.span().lo);
    Err(BundleError::Parse {
        path: path.to_path_buf(),
        message: format!(
            "{} ({}:{})",
            error.kind().msg(),
            loc.line,
            loc.col_display + 1
        ),
    })
}

/// Print a module back to source text
pub fn print_module(
    source_map: &Lrc<SourceMap>,
    comments: &SingleThreadedComments,
    module: &Module,
    minify: bool,
) -> BundleResult<String> {
    let mut buf = vec![];
    {
        let mut emitter = Emitter {
            cfg: CodegenConfig::default().with_minify(minify),
            cm: source_map.clone(),
            comments: if minify { None } else { Some(comments) },
            wr: Box::new(JsWriter::new(source_map.clone(), "\n", &mut buf, None)),
        };
        emitter
            .emit_module(module)
            .map_err(|source| BundleError::Codegen { source })?;
    }
    String::from_utf8(buf).map_err(|error| BundleError::Codegen {
        source: io::Error::new(io::ErrorKind::InvalidData, error),
    })
}

/// Parse a snippet in a throwaway session
#[cfg(test)]
pub(crate) fn parse_for_test(code: &str) -> (BundleSession, ParsedModule) {
    let session = BundleSession::new(crate::config::BundleOptions::default());
    let parsed = parse_module(&session, Path::new("/virtual/test.js"), code.to_owned())
        .expect("test source should parse");
    (session, parsed)
}

/// Drop all whitespace so assertions ignore formatting
#[cfg(test)]
pub(crate) fn squash(code: &str) -> String {
    code.chars().filter(|c| !c.is_whitespace()).collect()
}
