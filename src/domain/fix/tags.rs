//! FIX 4.2 tag numbers and enumerated values used by the gateway.

/// Field delimiter on the wire
pub const SOH: char = '\x01';

pub const BEGIN_STRING_FIX42: &str = "FIX.4.2";

// ===== Header =====

pub const BEGIN_STRING: u32 = 8;
pub const BODY_LENGTH: u32 = 9;
pub const MSG_TYPE: u32 = 35;
pub const SENDER_COMP_ID: u32 = 49;
pub const TARGET_COMP_ID: u32 = 56;
pub const TARGET_SUB_ID: u32 = 57;
pub const MSG_SEQ_NUM: u32 = 34;
pub const SENDING_TIME: u32 = 52;
pub const CHECKSUM: u32 = 10;

/// Tags that belong in the standard header rather than the body
pub const HEADER_TAGS: &[u32] = &[
    BEGIN_STRING,
    BODY_LENGTH,
    MSG_TYPE,
    SENDER_COMP_ID,
    TARGET_COMP_ID,
    TARGET_SUB_ID,
    MSG_SEQ_NUM,
    SENDING_TIME,
];

// ===== Body =====

pub const ACCOUNT: u32 = 1;
pub const AVG_PX: u32 = 6;
pub const CL_ORD_ID: u32 = 11;
pub const CUM_QTY: u32 = 14;
pub const EXEC_ID: u32 = 17;
pub const HANDL_INST: u32 = 21;
pub const LAST_PX: u32 = 31;
pub const LAST_QTY: u32 = 32;
pub const LINES_OF_TEXT: u32 = 33;
pub const ORDER_ID: u32 = 37;
pub const ORDER_QTY: u32 = 38;
pub const ORD_STATUS: u32 = 39;
pub const ORD_TYPE: u32 = 40;
pub const ORIG_CL_ORD_ID: u32 = 41;
pub const PRICE: u32 = 44;
pub const SIDE: u32 = 54;
pub const SYMBOL: u32 = 55;
pub const TEXT: u32 = 58;
pub const TRANSACT_TIME: u32 = 60;
pub const EX_DESTINATION: u32 = 100;
pub const HEARTBT_INT: u32 = 108;
pub const ENCRYPT_METHOD: u32 = 98;
pub const HEADLINE: u32 = 148;
pub const EXEC_TYPE: u32 = 150;
pub const LEAVES_QTY: u32 = 151;
pub const ORDER_QTY2: u32 = 192;

/// Venue-specific: names the account field whose value follows in tag 58
pub const ACCOUNT_FIELD_NAME: u32 = 10008;

// ===== MsgType values =====

pub mod msg_type {
    pub const HEARTBEAT: &str = "0";
    pub const LOGOUT: &str = "5";
    pub const EXECUTION_REPORT: &str = "8";
    pub const LOGON: &str = "A";
    pub const NEWS: &str = "B";
    pub const NEW_ORDER_SINGLE: &str = "D";
    pub const ORDER_CANCEL_REQUEST: &str = "F";
}

// ===== Enumerated field values =====

pub mod side {
    pub const BUY: char = '1';
    pub const SELL: char = '2';
}

pub mod ord_type {
    pub const MARKET: char = '1';
    pub const LIMIT: char = '2';
    pub const STOP: char = '3';
    pub const STOP_LIMIT: char = '4';
    pub const ON_CLOSE: char = '5';
}

pub mod exec_type {
    pub const NEW: char = '0';
    pub const PARTIAL_FILL: char = '1';
    pub const FILL: char = '2';
    pub const CANCELED: char = '4';
    pub const REJECTED: char = '8';
    pub const PENDING_NEW: char = 'A';
    /// Venue-specific position snapshot
    pub const POSITION: char = 'P';
}

/// HandlInst(21) = 2: manual order, best execution
pub const HANDL_INST_MANUAL_BEST_EXECUTION: char = '2';
