//! Steps de transformación (Transform)
//!
//! Leen una colección del contexto, aplican una función pura de
//! `ledger_core::transform` y escriben el resultado (por defecto sobre la
//! misma clave). Entrada ausente o malformada se trata como colección vacía
//! con warning.

use std::collections::HashSet;

use ledger_core::transform::{collapse_identical, concat_columns, drop_columns, filter_excluded, merge_left,
                             select_columns};
use ledger_core::{Context, RecordCollection, Step, StepKind, StepRunResult};
use tracing::{debug, warn};

fn read_lenient(ctx: &Context, key: &str, step_id: &str) -> RecordCollection {
    match ctx.collection(key) {
        Ok(Some(c)) => c,
        Ok(None) => {
            warn!(step_id, key, "clave ausente en el contexto; se usa colección vacía");
            RecordCollection::empty()
        }
        Err(e) => {
            warn!(step_id, key, error = %e, "colección con formato inesperado; se usa colección vacía");
            RecordCollection::empty()
        }
    }
}

/// Descarta registros cuyo campo está en la lista de exclusión.
pub struct FilterStep {
    id: String,
    input_key: String,
    output_key: String,
    field: String,
    excluded: HashSet<String>,
}

impl FilterStep {
    pub fn new<I, S>(id: impl Into<String>, key: impl Into<String>, field: impl Into<String>, excluded: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        let key = key.into();
        Self { id: id.into(),
               output_key: key.clone(),
               input_key: key,
               field: field.into(),
               excluded: excluded.into_iter().map(Into::into).collect() }
    }

    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = key.into();
        self
    }
}

impl Step for FilterStep {
    fn id(&self) -> &str { &self.id }

    fn kind(&self) -> StepKind { StepKind::Transform }

    fn run(&self, ctx: &mut Context) -> StepRunResult {
        let input = read_lenient(ctx, &self.input_key, &self.id);
        let out = filter_excluded(&input, &self.field, &self.excluded);
        debug!(before = input.len(), after = out.len(), "filtro aplicado");
        ctx.put_collection(self.output_key.clone(), out);
        StepRunResult::wrote(self.output_key.clone())
    }
}

/// Elimina columnas de cada registro.
pub struct DropColumnsStep {
    id: String,
    input_key: String,
    output_key: String,
    columns: Vec<String>,
}

impl DropColumnsStep {
    pub fn new<I, S>(id: impl Into<String>, key: impl Into<String>, columns: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        let key = key.into();
        Self { id: id.into(),
               output_key: key.clone(),
               input_key: key,
               columns: columns.into_iter().map(Into::into).collect() }
    }

    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = key.into();
        self
    }
}

impl Step for DropColumnsStep {
    fn id(&self) -> &str { &self.id }

    fn kind(&self) -> StepKind { StepKind::Transform }

    fn run(&self, ctx: &mut Context) -> StepRunResult {
        let input = read_lenient(ctx, &self.input_key, &self.id);
        ctx.put_collection(self.output_key.clone(), drop_columns(&input, &self.columns));
        StepRunResult::wrote(self.output_key.clone())
    }
}

/// Agrega una columna con la concatenación de otras.
pub struct ConcatColumnsStep {
    id: String,
    input_key: String,
    output_key: String,
    columns: Vec<String>,
    separator: String,
    new_column: String,
}

impl ConcatColumnsStep {
    pub fn new<I, S>(id: impl Into<String>,
                     key: impl Into<String>,
                     columns: I,
                     separator: impl Into<String>,
                     new_column: impl Into<String>)
                     -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        let key = key.into();
        Self { id: id.into(),
               output_key: key.clone(),
               input_key: key,
               columns: columns.into_iter().map(Into::into).collect(),
               separator: separator.into(),
               new_column: new_column.into() }
    }

    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = key.into();
        self
    }
}

impl Step for ConcatColumnsStep {
    fn id(&self) -> &str { &self.id }

    fn kind(&self) -> StepKind { StepKind::Transform }

    fn run(&self, ctx: &mut Context) -> StepRunResult {
        let input = read_lenient(ctx, &self.input_key, &self.id);
        let out = concat_columns(&input, &self.columns, &self.separator, &self.new_column);
        ctx.put_collection(self.output_key.clone(), out);
        StepRunResult::wrote(self.output_key.clone())
    }
}

/// Left join de dos colecciones del contexto por una columna común.
///
/// Cada lado puede proyectarse antes del join. Las columnas que aparecen en
/// ambos lados quedan como `<col>_x`/`<col>_y`, salvo cuando coinciden en
/// todas las filas: entonces se conserva una sola con su nombre original.
pub struct MergeLeftStep {
    id: String,
    left_key: String,
    right_key: String,
    on: String,
    output_key: String,
    left_columns: Option<Vec<String>>,
    right_columns: Option<Vec<String>>,
}

impl MergeLeftStep {
    pub fn new(id: impl Into<String>,
               left_key: impl Into<String>,
               right_key: impl Into<String>,
               on: impl Into<String>,
               output_key: impl Into<String>)
               -> Self {
        Self { id: id.into(),
               left_key: left_key.into(),
               right_key: right_key.into(),
               on: on.into(),
               output_key: output_key.into(),
               left_columns: None,
               right_columns: None }
    }

    pub fn with_left_columns<I, S>(mut self, columns: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.left_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_right_columns<I, S>(mut self, columns: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.right_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    fn side(&self, ctx: &Context, key: &str, columns: &Option<Vec<String>>) -> RecordCollection {
        let input = read_lenient(ctx, key, &self.id);
        match columns {
            Some(cols) => select_columns(&input, cols),
            None => input,
        }
    }
}

impl Step for MergeLeftStep {
    fn id(&self) -> &str { &self.id }

    fn kind(&self) -> StepKind { StepKind::Transform }

    fn run(&self, ctx: &mut Context) -> StepRunResult {
        let left = self.side(ctx, &self.left_key, &self.left_columns);
        let right = self.side(ctx, &self.right_key, &self.right_columns);

        let left_names: HashSet<&String> = left.iter().flat_map(|r| r.keys()).collect();
        let mut shared: Vec<String> = Vec::new();
        for name in right.iter().flat_map(|r| r.keys()) {
            if *name != self.on && left_names.contains(name) && !shared.contains(name) {
                shared.push(name.clone());
            }
        }

        let mut out = merge_left(&left, &right, &self.on);
        for column in &shared {
            out = collapse_identical(&out, column);
        }
        debug!(left = left.len(), right = right.len(), rows = out.len(), shared = shared.len(), "merge aplicado");
        ctx.put_collection(self.output_key.clone(), out);
        StepRunResult::wrote(self.output_key.clone())
    }
}
