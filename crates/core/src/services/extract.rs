use crate::db::AnalysisDatabase;
use crate::model::{EntityModel, DEFAULT_FUNCTION_NAME};
use crate::script::Directive;
use crate::services::convert::ConvertError;

/// Stream of directives produced by one extraction capability.
pub type DirectiveStream<'a> = Box<dyn Iterator<Item = Directive> + 'a>;

/// Where the facts come from.
///
/// Both variants answer the same three questions (functions, labels, comments);
/// the generator only talks to this type.
#[derive(Clone, Copy)]
pub enum Extraction<'a> {
    /// A fully parsed IDC log.
    Log(&'a EntityModel),
    /// A live database, queried lazily while the script is written.
    Database(&'a dyn AnalysisDatabase),
}

impl<'a> Extraction<'a> {
    pub fn functions(&self) -> Result<DirectiveStream<'a>, ConvertError> {
        match *self {
            Extraction::Log(model) => Ok(Box::new(
                model.functions.iter().filter(|f| f.is_named()).map(|f| {
                    Directive::DefineFunction {
                        address: f.address,
                        size: f.size,
                        name: f.name.clone(),
                        signature: f.signature.clone(),
                    }
                }),
            )),
            Extraction::Database(db) => {
                let functions = db.functions()?;
                Ok(Box::new(functions.into_iter().map(|f| Directive::AnalyzeFunction {
                    address: f.address,
                    name: f.name,
                })))
            }
        }
    }

    /// Local labels bound to a containing function. Databases expose none.
    pub fn labels(&self) -> DirectiveStream<'a> {
        match *self {
            Extraction::Log(model) => Box::new(
                model
                    .labels
                    .iter()
                    .filter(|l| l.name != DEFAULT_FUNCTION_NAME)
                    .filter(move |l| {
                        let bound = model.containing_function(l.address).is_some();
                        if !bound {
                            log::debug!("label {} at {:#x} is outside every function", l.name, l.address);
                        }
                        bound
                    })
                    .map(|l| Directive::LocalLabel { address: l.address, name: l.name.clone() }),
            ),
            Extraction::Database(_) => Box::new(std::iter::empty()),
        }
    }

    pub fn comments(&self) -> Result<DirectiveStream<'a>, ConvertError> {
        match *self {
            Extraction::Log(model) => Ok(Box::new(
                model
                    .comments
                    .iter()
                    .filter(|c| !c.text.is_empty())
                    .map(|c| Directive::RawComment { address: c.address, text: c.text.clone() }),
            )),
            Extraction::Database(db) => {
                let segments = db.segments()?;
                Ok(Box::new(segments.into_iter().flat_map(move |start| {
                    let end = db.segment_end(start).unwrap_or_else(|err| {
                        log::warn!("skipping segment at {start:#x}: {err}");
                        start
                    });
                    (start..end).filter_map(move |address| {
                        database_comment(db, address)
                            .map(|text| Directive::EncodedComment { address, text })
                    })
                })))
            }
        }
    }
}

/// Repeatable comment first; the regular one only when the repeatable lookup fails.
fn database_comment(db: &dyn AnalysisDatabase, address: u64) -> Option<String> {
    match db.comment(address, true) {
        Ok(text) => (!text.is_empty()).then_some(text),
        Err(err) => {
            log::trace!("{err}; trying regular comment");
            db.comment(address, false).ok().filter(|text| !text.is_empty())
        }
    }
}
