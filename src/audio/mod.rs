//! Système audio : synchronisation des trames émulées avec le DMA audio
//!
//! Le synchroniseur possède deux tampons DMA. Pendant qu'un tampon est lu
//! par le moteur DMA, l'autre reçoit les échantillons de la trame en cours.
//! Les rôles s'échangent au moment où le transfert suivant est armé.

pub mod error;
pub mod traits;
pub mod buffer;
pub mod drift;
pub mod sync;
pub mod dma;
pub mod host;
pub mod virtual_dma;
pub mod menu;
pub mod source;

pub use error::*;
pub use traits::*;
pub use buffer::*;
pub use drift::*;
pub use sync::*;
pub use dma::*;
pub use host::*;
pub use virtual_dma::*;
pub use menu::*;
pub use source::*;
