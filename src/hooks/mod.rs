mod event;
mod observer;
mod registry;

pub use event::{HookEvent, HookMask};
pub use observer::{
    DeleteRecordArgs, FnHook, HookCall, HookResult, SetRecordArgs, SpliceDynamicArgs,
    SpliceStaticArgs, StoreHook,
};
pub use registry::{HookEntry, HookRegistry};
