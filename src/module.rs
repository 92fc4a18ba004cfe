//! Load/unload lifecycle
//!
//! [`NandModule`] owns the injected environment (configuration lock, chip
//! allocator, flash subsystem) and at most one attached controller. There is
//! only one static bus, so at most one module in the process may be loaded
//! at a time.

use core::sync::atomic::{AtomicBool, Ordering};

use ox820_nand_core::attach::{Controller, Sequencer};
use ox820_nand_core::bus::{Delay, HwConfigLock, Mmio};
use ox820_nand_core::chip::ChipAllocator;
use ox820_nand_core::nand::StaticBusNand;
use ox820_nand_core::subsystem::FlashSubsystem;
use ox820_nand_core::{Error, Ox820Config};

use crate::error::Result;

/// Set while a controller is attached to the static bus
static ATTACHED: AtomicBool = AtomicBool::new(false);

fn claim_bus() -> bool {
    ATTACHED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
}

fn release_bus() {
    ATTACHED.store(false, Ordering::Release);
}

/// Check if any module in the process has a controller attached
pub fn bus_attached() -> bool {
    ATTACHED.load(Ordering::Acquire)
}

/// Host module for the OX820 static bus NAND
pub struct NandModule<L, A, S>
where
    L: HwConfigLock,
    A: ChipAllocator,
    S: FlashSubsystem,
{
    config: Ox820Config,
    lock: L,
    alloc: A,
    subsystem: S,
    controller: Option<Controller<S::Device>>,
}

impl<L, A, S> NandModule<L, A, S>
where
    L: HwConfigLock,
    A: ChipAllocator,
    S: FlashSubsystem,
{
    /// Create an unloaded module
    pub fn new(config: Ox820Config, lock: L, alloc: A, subsystem: S) -> Self {
        Self {
            config,
            lock,
            alloc,
            subsystem,
            controller: None,
        }
    }

    /// Attach the controller
    ///
    /// Fails with [`Error::AlreadyAttached`] if this or any other module is
    /// loaded; nothing is touched in that case.
    pub fn load<B, R, D>(&mut self, bus: B, sysctrl: &mut R, delay: D) -> Result<()>
    where
        B: Mmio,
        R: Mmio + ?Sized,
        D: Delay,
        S: FlashSubsystem<Transport = StaticBusNand<B, D>>,
    {
        if self.controller.is_some() || !claim_bus() {
            return Err(Error::AlreadyAttached.into());
        }

        let attached = Sequencer::new(
            &self.config,
            &self.lock,
            &mut self.alloc,
            &mut self.subsystem,
        )
        .attach(bus, sysctrl, delay);

        match attached {
            Ok(controller) => {
                self.controller = Some(controller);
                Ok(())
            }
            Err(e) => {
                release_bus();
                Err(e.into())
            }
        }
    }

    /// Detach the controller, if one is loaded
    pub fn unload(&mut self) {
        match self.controller.take() {
            Some(controller) => {
                controller.detach(&mut self.subsystem, &mut self.alloc);
                release_bus();
            }
            None => log::debug!("OX820 NAND not loaded, nothing to unload"),
        }
    }

    /// Check if this module has a controller attached
    pub fn is_loaded(&self) -> bool {
        self.controller.is_some()
    }

    /// The attached controller
    pub fn controller(&self) -> Option<&Controller<S::Device>> {
        self.controller.as_ref()
    }

    /// Board configuration
    pub fn config(&self) -> &Ox820Config {
        &self.config
    }

    /// The flash subsystem
    pub fn subsystem(&self) -> &S {
        &self.subsystem
    }

    /// The chip allocator
    pub fn allocator(&self) -> &A {
        &self.alloc
    }
}

#[cfg(feature = "physmap")]
impl<L, A, S> NandModule<L, A, S>
where
    L: HwConfigLock,
    A: ChipAllocator,
    S: FlashSubsystem<
        Transport = StaticBusNand<ox820_nand_physmap::PhysMap, ox820_nand_core::bus::StdDelay>,
    >,
{
    /// Map the board's register windows through /dev/mem and attach
    pub fn load_physmap(&mut self) -> Result<()> {
        if self.controller.is_some() || bus_attached() {
            return Err(Error::AlreadyAttached.into());
        }
        let hw = ox820_nand_physmap::Ox820Hardware::map(&self.config)?;
        let mut sysctrl = hw.sysctrl;
        self.load(hw.nand, &mut sysctrl, ox820_nand_core::bus::StdDelay)
    }
}

impl<L, A, S> Drop for NandModule<L, A, S>
where
    L: HwConfigLock,
    A: ChipAllocator,
    S: FlashSubsystem,
{
    fn drop(&mut self) {
        if self.controller.is_some() {
            log::warn!("OX820 NAND module dropped while loaded, detaching");
            self.unload();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModuleError;
    use ox820_nand_dummy::{
        CountingLock, DummyMtd, MtdEvent, MtdFaults, SimClock, SimNand, SimSysCtrl,
        SimTransport, TrackingAllocator,
    };

    use std::sync::{Mutex, MutexGuard};

    type TestModule = NandModule<CountingLock, TrackingAllocator, DummyMtd<SimTransport>>;

    /// The attach claim is process-wide, so tests touching it run one at a time
    static BUS: Mutex<()> = Mutex::new(());

    fn exclusive_bus() -> MutexGuard<'static, ()> {
        BUS.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn module(faults: MtdFaults) -> TestModule {
        let _ = env_logger::builder().is_test(true).try_init();
        NandModule::new(
            Ox820Config::default(),
            CountingLock::new(),
            TrackingAllocator::new(),
            DummyMtd::new(faults),
        )
    }

    fn load(module: &mut TestModule, nand: &SimNand) -> Result<()> {
        module.load(nand.clone(), &mut SimSysCtrl::new(), SimClock::new())
    }

    #[test]
    fn test_load_unload() {
        let _bus = exclusive_bus();
        let mut module = module(MtdFaults::default());
        let nand = SimNand::new_default();
        assert!(!module.is_loaded());

        load(&mut module, &nand).unwrap();
        assert!(module.is_loaded());
        assert_eq!(module.controller().unwrap().chip_delay_ms(), 25);

        module.unload();
        assert!(!module.is_loaded());
        assert_eq!(module.allocator().outstanding(), 0);
        assert_eq!(module.subsystem().chip_count(), 0);
    }

    #[test]
    fn test_second_load_rejected() {
        let _bus = exclusive_bus();
        let mut module = module(MtdFaults::default());
        let nand = SimNand::new_default();
        load(&mut module, &nand).unwrap();
        let writes = nand.state().bus_writes();

        let err = load(&mut module, &nand).unwrap_err();
        assert!(matches!(err, ModuleError::Nand(Error::AlreadyAttached)));
        assert_eq!(err.errno(), -16);
        assert_eq!(nand.state().bus_writes(), writes);
        assert_eq!(module.allocator().allocated(), 1);

        module.unload();
    }

    #[test]
    fn test_unload_is_idempotent() {
        let _bus = exclusive_bus();
        let mut module = module(MtdFaults::default());
        module.unload();
        assert!(module.subsystem().events().is_empty());

        load(&mut module, &SimNand::new_default()).unwrap();
        module.unload();
        module.unload();
        let unregisters = module
            .subsystem()
            .events()
            .iter()
            .filter(|e| matches!(e, MtdEvent::Unregister(_)))
            .count();
        assert_eq!(unregisters, 1);
        assert_eq!(module.allocator().freed(), 1);
    }

    #[test]
    fn test_failed_load_leaves_module_unloaded() {
        let _bus = exclusive_bus();
        let mut module = module(MtdFaults {
            register: true,
            ..Default::default()
        });
        let err = load(&mut module, &SimNand::new_default()).unwrap_err();
        assert!(matches!(err, ModuleError::Nand(Error::RegistrationFailure)));
        assert!(!module.is_loaded());
        assert_eq!(module.allocator().outstanding(), 0);

        module.unload();
        assert_eq!(module.allocator().freed(), 1);
    }

    #[test]
    fn test_reload_after_unload() {
        let _bus = exclusive_bus();
        let mut module = module(MtdFaults::default());
        let nand = SimNand::new_default();
        load(&mut module, &nand).unwrap();
        module.unload();
        load(&mut module, &nand).unwrap();
        assert!(module.is_loaded());
        assert_eq!(module.allocator().allocated(), 2);
        module.unload();
    }

    #[test]
    fn test_second_module_cannot_attach() {
        let _bus = exclusive_bus();
        let nand = SimNand::new_default();
        let mut first = module(MtdFaults::default());
        let mut second = module(MtdFaults::default());

        load(&mut first, &nand).unwrap();
        assert!(bus_attached());
        let writes = nand.state().bus_writes();

        let err = load(&mut second, &nand).unwrap_err();
        assert!(matches!(err, ModuleError::Nand(Error::AlreadyAttached)));
        assert!(!second.is_loaded());
        assert_eq!(second.allocator().allocated(), 0);
        assert!(second.subsystem().events().is_empty());
        assert_eq!(nand.state().bus_writes(), writes);

        first.unload();
        assert!(!bus_attached());
        load(&mut second, &nand).unwrap();
        assert!(second.is_loaded());
        second.unload();
    }

    #[test]
    fn test_failed_load_releases_bus() {
        let _bus = exclusive_bus();
        let mut failing = module(MtdFaults {
            scan: true,
            ..Default::default()
        });
        assert!(load(&mut failing, &SimNand::new_default()).is_err());
        assert!(!bus_attached());

        let mut module = module(MtdFaults::default());
        load(&mut module, &SimNand::new_default()).unwrap();
        module.unload();
    }

    #[test]
    fn test_drop_while_loaded_detaches() {
        let _bus = exclusive_bus();
        {
            let mut module = module(MtdFaults::default());
            load(&mut module, &SimNand::new_default()).unwrap();
            assert!(bus_attached());
        }
        assert!(!bus_attached());
    }
}
