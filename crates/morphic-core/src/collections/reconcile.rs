//! Collection transform and merge routines

use super::finder::{NullTargetFinder, TargetFinder, TargetFinderRegistry};
use crate::context::MappingContext;
use crate::error::{MappingError, MappingResult};
use crate::mapping::{Merge, MergeResult, Transform};
use morphic_reflect::{CollectionAdapter, TypeKey, Value};
use std::any::Any;
use std::sync::Arc;

/// Element-wise mapping between two concrete collection types
pub(crate) struct Reconciler {
    from: TypeKey,
    to: TypeKey,
    source: Arc<dyn CollectionAdapter>,
    target: Arc<dyn CollectionAdapter>,
    reference_elements: bool,
}

impl Reconciler {
    pub(crate) fn new(
        from: TypeKey,
        to: TypeKey,
        source: Arc<dyn CollectionAdapter>,
        target: Arc<dyn CollectionAdapter>,
        reference_elements: bool,
    ) -> Self {
        Self {
            from,
            to,
            source,
            target,
            reference_elements,
        }
    }

    /// New target collection holding the transformed source elements
    pub(crate) fn transform(&self, source: Option<&dyn Any>, ctx: &mut MappingContext<'_>) -> MappingResult<Option<Value>> {
        let Some(source) = source else {
            return Err(MappingError::NullMapping {
                from: self.from,
                to: self.to,
            });
        };
        let elements = self.transform_all(source, ctx)?;
        let mut created = self.target.create();
        self.refill(created.as_mut(), elements)?;
        Ok(Some(created))
    }

    /// Refill `target` from `source`
    ///
    /// Value-typed elements are transformed positionally. Reference-typed
    /// elements are merged into a copy of the existing element a
    /// [`TargetFinder`] locates, or transformed when none matches. Unmatched
    /// existing elements are dropped. `target` is only touched once every
    /// element has been mapped, so a failure leaves it unchanged.
    pub(crate) fn merge(
        &self,
        source: Option<&dyn Any>,
        target: Option<&mut dyn Any>,
        ctx: &mut MappingContext<'_>,
    ) -> MappingResult<MergeResult> {
        let Some(target) = target else {
            return Ok(MergeResult::replace(self.transform(source, ctx)?));
        };
        let Some(source) = source else {
            return Err(MappingError::NullMapping {
                from: self.from,
                to: self.to,
            });
        };

        let elements = if self.reference_elements {
            self.reconcile_all(source, target, ctx)?
        } else {
            self.transform_all(source, ctx)?
        };
        drop(self.target.drain(target)?);
        self.refill(target, elements)?;
        Ok(MergeResult::updated())
    }

    fn reconcile_all(&self, source: &dyn Any, target: &dyn Any, ctx: &mut MappingContext<'_>) -> MappingResult<Vec<Value>> {
        let (from_element, to_element) = (self.source.element(), self.target.element());
        let existing = self
            .target
            .items(target)?
            .into_iter()
            .map(|item| ctx.clone_value(to_element, item))
            .collect::<MappingResult<Vec<_>>>()?;
        let mut finder: Box<dyn TargetFinder> = ctx
            .services()
            .resolve::<TargetFinderRegistry>()
            .map_or_else(|| Box::new(NullTargetFinder) as Box<dyn TargetFinder>, |r| r.create(from_element, to_element));
        finder.initialize(existing);

        let mut merger: Option<Arc<Merge>> = None;
        let mut transformer: Option<Arc<Transform>> = None;
        let mut elements = Vec::new();
        for item in self.source.items(source)? {
            let element = match finder.find(item)? {
                Some(mut found) => {
                    let merge = match merger.clone() {
                        Some(merge) => merge,
                        None => {
                            let merge = ctx.merger(from_element, to_element)?;
                            merger = Some(Arc::clone(&merge));
                            merge
                        }
                    };
                    let slot: &mut dyn Any = found.as_mut();
                    let result = ctx.run_merge(&merge, Some(item), Some(slot))?;
                    if result.is_replace() {
                        result.into_replacement()
                    } else {
                        Some(found)
                    }
                }
                None => {
                    let transform = match transformer.clone() {
                        Some(transform) => transform,
                        None => {
                            let transform = ctx.transformer(from_element, to_element)?;
                            transformer = Some(Arc::clone(&transform));
                            transform
                        }
                    };
                    ctx.run_transform(&transform, Some(item))?
                }
            };
            match element {
                Some(element) => elements.push(element),
                None => tracing::trace!(element = %to_element, "null element skipped"),
            }
        }
        Ok(elements)
    }

    fn transform_all(&self, source: &dyn Any, ctx: &mut MappingContext<'_>) -> MappingResult<Vec<Value>> {
        let items = self.source.items(source)?;
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let transform = ctx.transformer(self.source.element(), self.target.element())?;
        let mut elements = Vec::with_capacity(items.len());
        for item in items {
            match ctx.run_transform(&transform, Some(item))? {
                Some(element) => elements.push(element),
                None => tracing::trace!(element = %self.target.element(), "null element skipped"),
            }
        }
        Ok(elements)
    }

    fn refill(&self, target: &mut dyn Any, elements: Vec<Value>) -> MappingResult<()> {
        for element in elements {
            self.target.push(target, element)?;
        }
        Ok(())
    }
}
