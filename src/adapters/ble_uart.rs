//! BLE UART adapter (Nordic UART Service).
//!
//! Carries the command byte stream from a BLE central to the
//! [`FrameDecoder`](crate::protocol::decoder::FrameDecoder).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid BLE GATT server via `esp_idf_svc::sys`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## GATT Service Layout
//!
//! | Characteristic | UUID                              | Perms                  |
//! |----------------|-----------------------------------|------------------------|
//! | RX             | `6e400002-…-e50e24dcca9e`         | Write + Write w/o rsp  |
//! | TX             | `6e400003-…-e50e24dcca9e`         | Notify                 |
//!
//! TX exists because NUS clients subscribe to it on connect; nothing is
//! ever notified on it.
//!
//! ## Task bridge
//!
//! GATTS callbacks run in the Bluedroid task.  They append RX bytes to the
//! [`SharedRxBuffer`] static [`NUS_RX`]; the main loop drains it through a
//! [`BleUartStream`].

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::Deque;
use log::{info, warn};

use crate::protocol::transport::ByteStream;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: u128 = 0x6e400001_b5a3_f393_e0a9_e50e24dcca9e;
pub const CHAR_RX: u128 = 0x6e400002_b5a3_f393_e0a9_e50e24dcca9e;
pub const CHAR_TX: u128 = 0x6e400003_b5a3_f393_e0a9_e50e24dcca9e;

/// RX buffer capacity.  Several maximum-size frames plus slack for a
/// burst of small BLE writes between two polls.
pub const RX_BUFFER_SIZE: usize = 256;

// ───────────────────────────────────────────────────────────────
// Shared RX buffer
// ───────────────────────────────────────────────────────────────

#[derive(Debug)]
struct RxState<const N: usize> {
    bytes: Deque<u8, N>,
    dropped: u32,
}

/// Fixed-capacity byte FIFO shared between the BLE task and the main loop.
///
/// Writers never block and never overwrite: bytes that do not fit are
/// dropped and counted.
pub struct SharedRxBuffer<const N: usize> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<RxState<N>>>,
}

impl<const N: usize> SharedRxBuffer<N> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(RxState {
                bytes: Deque::new(),
                dropped: 0,
            })),
        }
    }

    /// Append `data`; returns how many bytes were accepted.
    pub fn push(&self, data: &[u8]) -> usize {
        let (accepted, dropped_total) = self.inner.lock(|cell| {
            let mut rx = cell.borrow_mut();
            let mut accepted = 0;
            for &b in data {
                if rx.bytes.push_back(b).is_err() {
                    break;
                }
                accepted += 1;
            }
            let overflow = (data.len() - accepted) as u32;
            rx.dropped = rx.dropped.saturating_add(overflow);
            (accepted, rx.dropped)
        });
        if accepted < data.len() {
            warn!(
                "BLE: RX buffer full, dropped {} bytes ({} total)",
                data.len() - accepted,
                dropped_total
            );
        }
        accepted
    }

    pub fn len(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().bytes.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn front(&self) -> Option<u8> {
        self.inner.lock(|cell| cell.borrow().bytes.front().copied())
    }

    /// Pop up to `buf.len()` bytes into `buf`.
    pub fn pop_into(&self, buf: &mut [u8]) -> usize {
        self.inner.lock(|cell| {
            let mut rx = cell.borrow_mut();
            let mut n = 0;
            for slot in buf.iter_mut() {
                let Some(b) = rx.bytes.pop_front() else { break };
                *slot = b;
                n += 1;
            }
            n
        })
    }

    /// Total bytes dropped on overflow since boot.
    pub fn dropped(&self) -> u32 {
        self.inner.lock(|cell| cell.borrow().dropped)
    }

    pub fn clear(&self) {
        self.inner.lock(|cell| cell.borrow_mut().bytes.clear());
    }
}

impl<const N: usize> Default for SharedRxBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Bytes written to the NUS RX characteristic.
pub static NUS_RX: SharedRxBuffer<RX_BUFFER_SIZE> = SharedRxBuffer::new();

/// Main-loop view of a [`SharedRxBuffer`].
#[derive(Clone, Copy)]
pub struct BleUartStream<'a, const N: usize> {
    rx: &'a SharedRxBuffer<N>,
}

impl<'a, const N: usize> BleUartStream<'a, N> {
    pub fn new(rx: &'a SharedRxBuffer<N>) -> Self {
        Self { rx }
    }
}

impl<const N: usize> ByteStream for BleUartStream<'_, N> {
    fn available(&self) -> usize {
        self.rx.len()
    }

    fn peek(&self) -> Option<u8> {
        self.rx.front()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        self.rx.pop_into(buf)
    }
}

// ───────────────────────────────────────────────────────────────
// BLE state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleState {
    Idle,
    Advertising,
    Connected,
    Failed,
}

// ── ESP-IDF BLE static state ──────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures. These atomics bridge the callback context to the adapter.

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering as AtomicOrdering};

#[cfg(target_os = "espidf")]
static BLE_CONNECTED: AtomicBool = AtomicBool::new(false);
#[cfg(target_os = "espidf")]
static BLE_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_RX_CHAR_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_TX_CHAR_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CHAR_STEP: AtomicU32 = AtomicU32::new(0);

/// Client Characteristic Configuration descriptor.
#[cfg(target_os = "espidf")]
const CCCD_UUID16: u16 = 0x2902;

#[cfg(target_os = "espidf")]
fn uuid128_to_esp(uuid: u128) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 16;
    t.uuid.uuid128 = uuid.to_le_bytes();
    t
}

#[cfg(target_os = "espidf")]
unsafe fn add_gatt_char(svc_handle: u16, uuid: u128, perm: u32, prop: u32) {
    use esp_idf_svc::sys::*;
    let mut char_uuid = uuid128_to_esp(uuid);
    unsafe {
        esp_ble_gatts_add_char(
            svc_handle,
            &mut char_uuid,
            perm as esp_gatt_perm_t,
            prop as esp_gatt_char_prop_t,
            core::ptr::null_mut(),
            core::ptr::null_mut(),
        );
    }
}

#[cfg(target_os = "espidf")]
unsafe fn start_advertising() {
    use esp_idf_svc::sys::*;
    unsafe {
        let mut adv_params = esp_ble_adv_params_t {
            adv_int_min: 0x20,
            adv_int_max: 0x40,
            adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
            own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
            channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
            adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
            ..core::mem::zeroed()
        };
        esp_ble_gap_start_advertising(&mut adv_params);
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    _param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_SET_COMPLETE_EVT => unsafe {
            start_advertising();
        },
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising started");
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising stopped");
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use esp_idf_svc::sys::*;

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => unsafe {
            log::info!("BLE GATTS: app registered (if={})", gatts_if);
            let mut svc_id = esp_gatt_srvc_id_t {
                id: esp_gatt_id_t {
                    uuid: uuid128_to_esp(SERVICE_UUID),
                    inst_id: 0,
                },
                is_primary: true,
            };
            // service + 2 × (decl + value) + CCCD
            esp_ble_gatts_create_service(gatts_if, &mut svc_id, 8);
        },
        esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => unsafe {
            let svc_handle = (*param).create.service_handle;
            BLE_SVC_HANDLE.store(u32::from(svc_handle), AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: NUS service created (handle={})", svc_handle);
            esp_ble_gatts_start_service(svc_handle);
            BLE_CHAR_STEP.store(1, AtomicOrdering::Relaxed);
            add_gatt_char(
                svc_handle,
                CHAR_RX,
                ESP_GATT_PERM_WRITE,
                ESP_GATT_CHAR_PROP_BIT_WRITE | ESP_GATT_CHAR_PROP_BIT_WRITE_NR,
            );
        },
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => unsafe {
            let handle = (*param).add_char.attr_handle;
            let svc_handle = BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed) as u16;
            match BLE_CHAR_STEP.load(AtomicOrdering::Relaxed) {
                1 => {
                    BLE_RX_CHAR_HANDLE.store(u32::from(handle), AtomicOrdering::Relaxed);
                    log::info!("BLE GATTS: RX char (handle={})", handle);
                    BLE_CHAR_STEP.store(2, AtomicOrdering::Relaxed);
                    add_gatt_char(
                        svc_handle,
                        CHAR_TX,
                        ESP_GATT_PERM_READ,
                        ESP_GATT_CHAR_PROP_BIT_NOTIFY,
                    );
                }
                2 => {
                    BLE_TX_CHAR_HANDLE.store(u32::from(handle), AtomicOrdering::Relaxed);
                    log::info!("BLE GATTS: TX char (handle={})", handle);
                    BLE_CHAR_STEP.store(3, AtomicOrdering::Relaxed);
                    let mut cccd: esp_bt_uuid_t = core::mem::zeroed();
                    cccd.len = 2;
                    cccd.uuid.uuid16 = CCCD_UUID16;
                    esp_ble_gatts_add_char_descr(
                        svc_handle,
                        &mut cccd,
                        (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
                        core::ptr::null_mut(),
                        core::ptr::null_mut(),
                    );
                }
                _ => {}
            }
        },
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
            log::info!("BLE GATTS: TX CCCD added, all registered");
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => unsafe {
            let conn_id = (*param).connect.conn_id;
            BLE_CONNECTED.store(true, AtomicOrdering::Relaxed);
            NUS_RX.clear();
            log::info!("BLE GATTS: client connected (conn_id={})", conn_id);
        },
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => unsafe {
            BLE_CONNECTED.store(false, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: client disconnected");
            start_advertising();
        },
        esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => unsafe {
            let p = &(*param).write;
            if u32::from(p.handle) == BLE_RX_CHAR_HANDLE.load(AtomicOrdering::Relaxed) {
                let data = core::slice::from_raw_parts(p.value, usize::from(p.len));
                NUS_RX.push(data);
            }
            if p.need_rsp {
                esp_ble_gatts_send_response(
                    gatts_if,
                    p.conn_id,
                    p.trans_id,
                    esp_gatt_status_t_ESP_GATT_OK,
                    core::ptr::null_mut(),
                );
            }
        },
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────
// Advertised name
// ───────────────────────────────────────────────────────────────

/// Local name the glove advertises: `truetouch-xxyyzz`, the last three
/// factory MAC bytes in lowercase hex.
pub fn advertised_name() -> heapless::String<24> {
    name_from_mac(&factory_mac())
}

fn name_from_mac(mac: &[u8; 6]) -> heapless::String<24> {
    use core::fmt::Write;
    let mut name = heapless::String::new();
    let _ = write!(name, "truetouch-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    name
}

#[cfg(target_os = "espidf")]
fn factory_mac() -> [u8; 6] {
    let mut mac = [0u8; 6];
    // SAFETY: eFuse read into a 6-byte buffer, as the API requires.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

#[cfg(not(target_os = "espidf"))]
fn factory_mac() -> [u8; 6] {
    [0x7C, 0xDF, 0xA1, 0x0B, 0x1E, 0x55]
}

// ───────────────────────────────────────────────────────────────
// BLE UART adapter
// ───────────────────────────────────────────────────────────────

pub struct BleUartAdapter {
    state: BleState,
    device_name: heapless::String<24>,
    rx: &'static SharedRxBuffer<RX_BUFFER_SIZE>,
}

impl BleUartAdapter {
    pub fn new(device_name: heapless::String<24>, rx: &'static SharedRxBuffer<RX_BUFFER_SIZE>) -> Self {
        Self {
            state: BleState::Idle,
            device_name,
            rx,
        }
    }

    pub fn state(&self) -> BleState {
        #[cfg(target_os = "espidf")]
        if self.state == BleState::Advertising && BLE_CONNECTED.load(AtomicOrdering::Relaxed) {
            return BleState::Connected;
        }
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state(), BleState::Advertising | BleState::Connected)
    }

    /// The byte stream the main loop decodes from.
    pub fn stream(&self) -> BleUartStream<'static, RX_BUFFER_SIZE> {
        BleUartStream::new(self.rx)
    }

    pub fn start(&mut self) {
        info!("BLE: starting advertising as '{}'", self.device_name);
        self.platform_start();
        if self.state != BleState::Failed {
            self.state = BleState::Advertising;
        }
    }

    pub fn stop(&mut self) {
        self.platform_stop();
        self.state = BleState::Idle;
        self.rx.clear();
        info!("BLE: stopped");
    }

    /// A new central starts with an empty stream: stale partial frames
    /// from a previous connection must not prefix its first command.
    pub fn on_central_connected(&mut self) {
        info!("BLE: central connected");
        self.rx.clear();
        self.state = BleState::Connected;
    }

    pub fn on_central_disconnected(&mut self) {
        info!("BLE: central disconnected");
        if self.state != BleState::Idle {
            self.state = BleState::Advertising;
        }
    }

    /// Bytes written to the RX characteristic.
    pub fn on_rx_write(&mut self, data: &[u8]) -> usize {
        self.rx.push(data)
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) {
        use esp_idf_svc::sys::*;
        use log::error;
        unsafe {
            // Release classic BT memory (BLE-only mode saves ~30 KB).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            let ret = esp_bt_controller_init(&mut bt_cfg);
            if ret != ESP_OK as i32 {
                error!("BLE: bt_controller_init failed ({})", ret);
                self.state = BleState::Failed;
                return;
            }

            let ret = esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE);
            if ret != ESP_OK as i32 {
                error!("BLE: bt_controller_enable failed ({})", ret);
                self.state = BleState::Failed;
                return;
            }

            let ret = esp_bluedroid_init();
            if ret != ESP_OK as i32 {
                error!("BLE: bluedroid_init failed ({})", ret);
                self.state = BleState::Failed;
                return;
            }

            let ret = esp_bluedroid_enable();
            if ret != ESP_OK as i32 {
                error!("BLE: bluedroid_enable failed ({})", ret);
                self.state = BleState::Failed;
                return;
            }

            esp_ble_gap_register_callback(Some(ble_gap_event_handler));
            esp_ble_gatts_register_callback(Some(ble_gatts_event_handler));
            esp_ble_gatts_app_register(0);

            // NUL-terminated copy for the C API.
            let mut name = [0u8; 25];
            let bytes = self.device_name.as_bytes();
            name[..bytes.len()].copy_from_slice(bytes);
            esp_ble_gap_set_device_name(name.as_ptr() as *const _);

            // Advertising starts once the stack confirms the data
            // (ESP_GAP_BLE_ADV_DATA_SET_COMPLETE_EVT).
            let mut adv_data = esp_ble_adv_data_t {
                set_scan_rsp: false,
                include_name: true,
                include_txpower: false,
                flag: (ESP_BLE_ADV_FLAG_GEN_DISC | ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8,
                ..core::mem::zeroed()
            };
            esp_ble_gap_config_adv_data(&mut adv_data);

            info!(
                "BLE(espidf): Bluedroid stack initialized, NUS as '{}'",
                self.device_name
            );
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) {
        info!(
            "BLE(sim): advertising '{}' (service {:032x})",
            self.device_name, SERVICE_UUID
        );
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&mut self) {
        use esp_idf_svc::sys::*;
        unsafe {
            esp_ble_gap_stop_advertising();
            esp_bluedroid_disable();
            esp_bluedroid_deinit();
            esp_bt_controller_disable();
            esp_bt_controller_deinit();
        }
        BLE_CONNECTED.store(false, AtomicOrdering::Relaxed);
        info!("BLE(espidf): stack shut down");
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&mut self) {
        info!("BLE(sim): stopped");
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
