//! Browser bindings for the Biconomy social-login SDK and the ethers `Web3Provider`.
//!
//! Both packages are imported as ES modules, so the final bundle must resolve
//! `@biconomy/web3-auth` and `ethers`.

use super::{RawProvider, RpcProvider, SdkError, SdkFuture, WalletBackend, WalletSdk};
use crate::option::SdkInitConfig;
use js_sys::{Promise, Reflect};
use serde::Serialize;
use std::fmt;
#[cfg(feature = "tracing")]
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen(module = "@biconomy/web3-auth")]
extern "C" {
    #[wasm_bindgen(js_name = default)]
    type SocialLogin;

    #[wasm_bindgen(constructor, js_class = "default")]
    fn new() -> SocialLogin;

    #[wasm_bindgen(method, catch)]
    fn init(this: &SocialLogin, config: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, js_name = showWallet)]
    fn show_wallet(this: &SocialLogin);

    #[wasm_bindgen(method, js_name = hideWallet)]
    fn hide_wallet(this: &SocialLogin);

    #[wasm_bindgen(method, catch)]
    fn logout(this: &SocialLogin) -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, getter)]
    fn provider(this: &SocialLogin) -> JsValue;

    #[wasm_bindgen(method, getter)]
    fn web3auth(this: &SocialLogin) -> JsValue;
}

#[wasm_bindgen(module = "ethers")]
extern "C" {
    #[wasm_bindgen(js_namespace = providers)]
    type Web3Provider;

    #[wasm_bindgen(constructor, js_namespace = providers)]
    fn new(provider: &JsValue) -> Web3Provider;

    #[wasm_bindgen(method, js_name = getSigner)]
    fn get_signer(this: &Web3Provider) -> Signer;

    #[wasm_bindgen(method, catch, js_name = getNetwork)]
    fn get_network(this: &Web3Provider) -> Result<Promise, JsValue>;

    type Signer;

    #[wasm_bindgen(method, catch, js_name = getAddress)]
    fn get_address(this: &Signer) -> Result<Promise, JsValue>;
}

fn js_error(value: JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

async fn resolve(promise: Result<Promise, JsValue>) -> Result<JsValue, String> {
    let promise = promise.map_err(js_error)?;
    JsFuture::from(promise).await.map_err(js_error)
}

/// Stops an injected browser wallet from reloading the page when its network changes.
///
/// Does nothing if no wallet is injected.
pub fn disable_injected_auto_refresh() {
    let global = js_sys::global();
    let Ok(ethereum) = Reflect::get(&global, &JsValue::from_str("ethereum")) else {
        return;
    };
    if !ethereum.is_object() {
        return;
    }

    if Reflect::set(
        &ethereum,
        &JsValue::from_str("autoRefreshOnNetworkChange"),
        &JsValue::FALSE,
    )
    .is_err()
    {
        #[cfg(feature = "tracing")]
        warn!("Failed to disable autoRefreshOnNetworkChange on the injected wallet");
    }
}

/// A handle to a `SocialLogin` instance.
pub struct JsSdk {
    inner: SocialLogin,
}

impl fmt::Debug for JsSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsSdk").finish_non_exhaustive()
    }
}

impl WalletSdk for JsSdk {
    type Provider = JsValue;

    fn init<'a>(&'a self, config: &'a SdkInitConfig) -> SdkFuture<'a, Result<(), SdkError>> {
        Box::pin(async move {
            let value = config
                .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
                .map_err(|e| SdkError::Init(e.to_string()))?;
            resolve(self.inner.init(&value))
                .await
                .map(|_| ())
                .map_err(SdkError::Init)
        })
    }

    fn show_wallet(&self) {
        self.inner.show_wallet();
    }

    fn hide_wallet(&self) {
        self.inner.hide_wallet();
    }

    fn logout(&self) -> SdkFuture<'_, Result<(), SdkError>> {
        Box::pin(async move {
            resolve(self.inner.logout())
                .await
                .map(|_| ())
                .map_err(SdkError::Logout)
        })
    }

    fn provider(&self) -> Option<JsValue> {
        let provider = self.inner.provider();
        if provider.is_null() || provider.is_undefined() {
            None
        } else {
            Some(provider)
        }
    }

    fn has_auth_state(&self) -> bool {
        let web3auth = self.inner.web3auth();
        !(web3auth.is_null() || web3auth.is_undefined())
    }
}

/// An ethers `Web3Provider` wrapping the SDK's provider.
#[derive(Debug, Clone)]
pub struct JsRpcProvider {
    inner: Web3Provider,
}

impl JsRpcProvider {
    /// Wraps an EIP-1193 provider.
    pub fn new(provider: &JsValue) -> Self {
        Self {
            inner: Web3Provider::new(provider),
        }
    }

    /// The underlying `Web3Provider` object.
    pub fn as_js_value(&self) -> &JsValue {
        self.inner.as_ref()
    }
}

impl RpcProvider for JsRpcProvider {
    fn signer_address(&self) -> SdkFuture<'_, Result<String, SdkError>> {
        Box::pin(async move {
            let address = resolve(self.inner.get_signer().get_address())
                .await
                .map_err(SdkError::Rpc)?;
            address
                .as_string()
                .ok_or_else(|| SdkError::Rpc(format!("Invalid signer address: {:?}", address)))
        })
    }

    fn chain_id(&self) -> SdkFuture<'_, Result<u64, SdkError>> {
        Box::pin(async move {
            let network = resolve(self.inner.get_network())
                .await
                .map_err(SdkError::Rpc)?;
            let chain_id = Reflect::get(&network, &JsValue::from_str("chainId"))
                .map_err(|e| SdkError::Rpc(js_error(e)))?;
            chain_id
                .as_f64()
                .filter(|id| id.fract() == 0.0 && *id >= 0.0)
                .map(|id| id as u64)
                .ok_or_else(|| SdkError::Rpc(format!("Invalid chain id: {:?}", chain_id)))
        })
    }
}

/// The browser backend: Biconomy `SocialLogin` handles and ethers `Web3Provider`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsBackend;

impl WalletBackend for JsBackend {
    type Sdk = JsSdk;
    type Rpc = JsRpcProvider;

    fn create_sdk(&self) -> JsSdk {
        JsSdk {
            inner: SocialLogin::new(),
        }
    }

    fn wrap_provider(&self, provider: &RawProvider<Self>) -> JsRpcProvider {
        JsRpcProvider::new(provider)
    }
}
