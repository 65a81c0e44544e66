use serde::{Deserialize, Serialize};

use crate::model::Context;
use super::run_result::StepRunResult;

/// Categoría del step. Determina qué efectos secundarios se esperan de él.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    /// Lee de la fuente remota y escribe colecciones en el contexto.
    Extract,
    /// Reescribe claves del contexto; sin I/O externo.
    Transform,
    /// Persiste colecciones del contexto; no produce claves nuevas.
    Store,
    /// Verificación previa (conectividad, precondiciones).
    Checkpoint,
}

/// Trait que define un Step del pipeline.
///
/// El step recibe el contexto compartido y lo muta en su lugar. "Sin datos"
/// no es un fallo: el step deja una colección vacía y retorna `Success`.
pub trait Step {
    /// Identificador estable y único dentro del pipeline.
    fn id(&self) -> &str;

    /// Nombre opcional amigable.
    fn name(&self) -> &str { self.id() }

    /// Tipo general del step.
    fn kind(&self) -> StepKind;

    /// Ejecuta el step. `outputs` en el resultado lista las claves escritas.
    fn run(&self, ctx: &mut Context) -> StepRunResult;
}

impl<S: Step + ?Sized> Step for Box<S> {
    fn id(&self) -> &str { (**self).id() }
    fn name(&self) -> &str { (**self).name() }
    fn kind(&self) -> StepKind { (**self).kind() }
    fn run(&self, ctx: &mut Context) -> StepRunResult { (**self).run(ctx) }
}
