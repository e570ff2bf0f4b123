use super::scanner::scan;
use super::types::{Pipeline, Stage, Token};
use crate::env::Env;
use crate::error::{Error, SyntaxError};
use crate::resolve::Resolver;

/// Parse a command line into a [`Pipeline`].
///
/// Every backquoted span is handed, raw, to `resolver`, and its result is
/// glued onto the argument being built. The whole line is scanned before the
/// first substitution runs, so malformed quoting never reaches the resolver.
///
/// Arguments that end up empty are dropped: `a "" b` has two arguments, and
/// a stage left with none is a syntax error. A blank line yields an empty
/// pipeline.
pub fn assemble<R>(text: &str, resolver: &mut R, env: &Env) -> Result<Pipeline, Error>
where
    R: Resolver + ?Sized,
{
    let tokens = scan(text, env)?;

    let mut builder = PipelineBuilder::default();
    for token in tokens {
        match token {
            Token::Space => builder.end_arg(),
            Token::String(text) => builder.push(&text),
            Token::ReverseQuote(raw) => {
                let value = resolver.resolve(&raw).map_err(Error::Resolver)?;
                log::debug!("substituted `{raw}` with {value:?}");
                builder.push(&value);
            }
            Token::Pipe => builder.end_stage()?,
            Token::End => break,
        }
    }

    let pipeline = builder.finish()?;
    log::debug!("assembled {} stage(s) from {text:?}", pipeline.len());
    Ok(pipeline)
}

#[derive(Debug, Default)]
struct PipelineBuilder {
    stages: Vec<Stage>,
    args: Vec<String>,
    arg: String,
}

impl PipelineBuilder {
    fn push(&mut self, text: &str) {
        self.arg.push_str(text);
    }

    fn end_arg(&mut self) {
        if !self.arg.is_empty() {
            self.args.push(std::mem::take(&mut self.arg));
        }
    }

    fn end_stage(&mut self) -> Result<(), SyntaxError> {
        self.end_arg();
        if self.args.is_empty() {
            return Err(SyntaxError::EmptyStage {
                stage: self.stages.len(),
            });
        }
        self.stages.push(Stage::from(std::mem::take(&mut self.args)));
        Ok(())
    }

    fn finish(mut self) -> Result<Pipeline, SyntaxError> {
        self.end_arg();
        // A blank line is not an error, a trailing pipe is.
        if self.stages.is_empty() && self.args.is_empty() {
            return Ok(Pipeline::default());
        }
        self.end_stage()?;
        Ok(Pipeline {
            stages: self.stages,
        })
    }
}
