//! Client configuration.
//!
//! [`ClientConfig`] carries every knob the request pipeline reads: endpoint
//! host, timeout, retry policy, logging verbosity, proxy, and the material
//! attached to signed requests. All fields have working defaults; override
//! them with the `with_*` methods.
//!
//! ```
//! use std::time::Duration;
//! use xhs_api::ClientConfig;
//!
//! let config = ClientConfig::default()
//!     .with_timeout(Duration::from_secs(10))
//!     .with_max_retries(5)
//!     .with_sign_script("vendor/signature.js");
//! assert_eq!(config.max_retries, 5);
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// API host. All endpoint paths are appended to this.
pub const BASE_URL: &str = "https://edith.xiaohongshu.com";

/// Web frontend origin, sent as `origin` / `referer`.
pub const WEB_ORIGIN: &str = "https://www.xiaohongshu.com";

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(60);

/// Static `x-s-common` value attached to note-detail and comment-post calls.
///
/// Captured from the web client. Whether the server ties it to an endpoint
/// or a time window has not been verified; override it through
/// [`ClientConfig::with_common_token`] if calls start failing.
pub const COMMON_TOKEN: &str = "\
    2UQAPsHCPUIjqArjwjHjNsQhPsHCH0rjNsQhPaHCH0c1PahIHjIj2eHjwjQ+GnPW/MPjNsQh\
    PUHCHdYiqUMIGUM78nHjNsQh+sHCH0c1+0H1PUHVHdWMH0ijP/DAP9L9P/DhPerUJoL72nIM\
    +9Qf8fpC2fHA8n4Fy0m1Gnpd4n+I+BHAPeZIPerMw/GhPjHVHdW9H0il+Ac7weZ7PAWU+/LU\
    NsQh+UHCHSY8pMRS2LkCGp4D4pLAndpQyfRk/Sz8yLleadkYp9zMpDYV4Mk/a/8QJf4EanS7\
    ypSGcd4/pMbk/9St+BbH/gz0zFMF8eQnyLSk49S0Pfl1GflyJB+1/dmjP0zk/9SQ2rSk49S0\
    zFGMGDqEybkea/8QJLkx/fkb+pkgpfYwpFSE/p4Q4MkLp/+ypMph/dkDJpkTp/p+pB4C/F4a\
    yDETn/Qw2fPI/Szz4MSgngkwPSk3nSzwyDRrp/myySLF/dkp2rMra/QypMDlnnM8PrEL/fMy\
    pMLA/L4aybkLz/p+pMQT/LzQ+LRLc/+8yfzVnD4+2bkLzflwzbQx/nktJLELngY+yfVMngkt\
    JrEr/gY+ySrF/nkm2DFUnfkwJL83nD4zPFMgz/+Ozrk3/Lz8+pkrafkyprbE/M4p+pkrngYy\
    pbphnnM+PMkxcg482fYxnD4p+rExyBMyzFFl/dk0PFMCp/pOzrFM/Dz04FECcg4yzBzingkz\
    +LMCafS+pMQi/fM8PDEx/gYyzFEinfM8PLETpg4wprDM/0QwJbSgzg4OpBTCnDz+4MSxy74w\
    ySQx/L4tJpkLngSwzB4hn/QbPrErL/zwJLMh/gkp2SSLa/bwzFEknpzz2LMx/gSwpMDA//Qz\
    4Mkr/fMwzrLA/nMzPSkTnfk+2fVM/pzpPMkrzfY8pFDInS4ayLELafSOzbb7npzDJpkLy7kw\
    zBl3/gkDyDRL87Y+yDMC/DzaJpkrLg4+PSkknDzQ4FEoL/zwpBVUngkVyLMoL/m8JLp7/nMy\
    JLMC8BTwpbphnDziyLExzgY+yDEinpzz2pkTpgk8yDbC/0QByFMTn/zOzbDl/LziJpSLcgYy\
    pFDlnnMQPFMC8A+ypBVl/gk32pkLL/++zFk3anhIOaHVHdWhH0ija/PhqDYD87+xJ7mdag8S\
    q9zn494QcUT6aLpPJLQy+nLApd4G/B4BprShLA+jqg4bqD8S8gYDPBp3Jf+m2DMBnnEl4BYQ\
    yrkSL9zL2obl49zQ4DbApFQ0yo4c4ozdJ/c9aMpC2rSiPoPI/rTAydb7JdD7zbkQ4fRA2BQc\
    ydSy4LbQyrTSzBr7q98ppbztqgzat7b7cgmDqrEQc9YT/Sqha7kn4M+Qc94Sy7pFao4l4FzQ\
    zL8laLL6qMzQnfSQ2oQ+ag8d8nzl4MH3+7mc2Skwq9z8P9pfqgzmanTw8/+n494lqgzIqopF\
    2rTC87Plp7mSaL+npFSiL/Z6LozzaM87cLDAn0Q6JnzSygb78DSecnpLpdzUaLL3tFSbJnE0\
    8fzSyf4CngQ6J7+fqg4OnS468nzPzrzsJ94AySkIcDSha7+DpdzYanT98n8l4MQj/LlQz9GF\
    cDDA+7+hqgzbNM4O8gWIJezQybbAaLLhtFYd/B8Q2rpAwrMVJLS3G98jLo4/aL+lpAYdad+8\
    nLRAyMm7LDDAa9pfcDbS8eZFtFSbPo+hGfMr4bm7yDS3a9LA878ApfF6qAbc4rEINFRSydp7\
    pDS9zn4Ccg8SL7p74Dlsad+/4gq3a/PhJDDAwepT4g4oJpm7afRmy/zNpFESzBqM8/8l49+Q\
    yBpAzeq98/bCL0SQzLEA8DMSqA8xG9lQyFESPMmFprSkG0mELozIaSm78rSh8npkpdzBaLLI\
    qMzM4M+QysRAzopFL74M47+6pdzGag8HpLDAagrFGgmaLLzdqA+l4r+Q2BM+anTtqFzl4obP\
    zsTYJAZIq9cIaB8QygQsz7pFJ7QM49lQ4DESpSmFnaTBa9pkGFEAyLSC8LSi87P9JA8ApopF\
    qURn47bQPFbSPob7yrS389L9q7pPaL+D8pSA4fpfLoz+a/P7qM8M47pOcLclanS84FSh8BL9\
    2DkA2bSdqFzyP9prpd4YanW3pFSezfV6Lo41a/+rpDSkafpnagk+2/498n8n4AQQyMZ6JSm7\
    anMU8nLIaLbA8dpF8Lll4rRQy9D9aLpz+bmn4oSOqg4Ca/P6q9kQ+npkLo4lqgbFJDSi+ezA\
    4gc9a/+ynSkSzFkQynzAzeqAq9k68Bp34gqhaopFtFSknSbQP9zA+dpFpDSkJ9p8zrpfag8a\
    J9RgL9+Qzp+SaL+m8/bl4Mq6pdc3/S8FJrShLr+QzLbAnnLI8/+l4A+IGdQeag8c8AYl4sTO\
    Loz+anTUarS3JpSQPMQPagGI8nzj+g+/L7i94M8FnDDAap4Y4g4YGdp7pFSiPBp3+7QGanSc\
    cLldPBprLozk8gpFJnRCLB+7+9+3anTzyomM47pQyFRAPnF3GFS3LfRFpd4FagY/pfMl4sTH\
    pdzNaL+/aLDAy9VjNsQhwaHCP/HlweGM+/Z9PjIj2erIH0iU+emR";

/// Configuration shared by [`XhsClient`](crate::XhsClient) and
/// [`AsyncXhsClient`](crate::AsyncXhsClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API host, without trailing slash.
    pub base_url: String,
    /// Per-call timeout, applied client-wide.
    pub timeout: Duration,
    /// Retries after the first attempt (`3` means at most 4 calls).
    pub max_retries: u32,
    /// Base delay; retry `n` waits `retry_delay * n`.
    pub retry_delay: Duration,
    /// Wait advised to the retry loop when the server reports a rate limit.
    pub rate_limit_backoff: Duration,
    /// Log request/response metadata at `debug` level.
    pub verbose: bool,
    /// Proxy URL applied to all traffic, e.g. `http://127.0.0.1:7890`.
    pub proxy: Option<String>,
    /// `user-agent` header value.
    pub user_agent: String,
    /// `x-s-common` header value.
    pub common_token: String,
    /// Path of the vendor signing script used when no
    /// [`SignatureProvider`](crate::sign::SignatureProvider) is supplied.
    pub sign_script: Option<PathBuf>,
    /// JavaScript runtime executing `sign_script`.
    pub js_runtime: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            rate_limit_backoff: DEFAULT_RATE_LIMIT_BACKOFF,
            verbose: false,
            proxy: None,
            user_agent: USER_AGENT.to_owned(),
            common_token: COMMON_TOKEN.to_owned(),
            sign_script: None,
            js_runtime: PathBuf::from("node"),
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_owned();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    #[must_use]
    pub fn with_rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }

    /// Enable request/response logging. Cookie values are never logged.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: &str) -> Self {
        self.proxy = Some(proxy.to_owned());
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, ua: &str) -> Self {
        self.user_agent = ua.to_owned();
        self
    }

    #[must_use]
    pub fn with_common_token(mut self, token: &str) -> Self {
        self.common_token = token.to_owned();
        self
    }

    #[must_use]
    pub fn with_sign_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.sign_script = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_js_runtime(mut self, runtime: impl Into<PathBuf>) -> Self {
        self.js_runtime = runtime.into();
        self
    }
}
